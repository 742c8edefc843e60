use nutype::nutype;

use crate::email_address::EmailAddress;

/// A fully validated submission of the contact form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub author: ContactMessageAuthor,
    pub content: ContactMessageContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessageAuthor {
    pub name: ContactMessageAuthorName,
    pub email: EmailAddress,
}

#[nutype(
    validate(not_empty),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactMessageAuthorName(String);

#[nutype(
    validate(not_empty),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactMessageContent(String);
