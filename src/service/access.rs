//! Item access policy.
//!
//! The owner may do anything with an item. A user on the item's share list
//! may view and update it but never delete or re-share it. Everyone else is
//! denied. Roles play no part here.

use super::error::{ServiceError, ServiceResult};
use super::messages;
use crate::db::{Item, Share, User};

/// What a caller wants to do with an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    View,
    Update,
    Delete,
    Share,
}

impl Operation {
    fn denied_message(self) -> &'static str {
        match self {
            Operation::View => messages::CANNOT_ACCESS,
            Operation::Update => messages::CANNOT_UPDATE,
            Operation::Delete => messages::CANNOT_DELETE,
            Operation::Share => messages::CANNOT_SHARE,
        }
    }
}

/// Whether `user` may perform `operation` on `item`, given the item's share rows.
pub fn can_access(user: &User, item: &Item, shares: &[Share], operation: Operation) -> bool {
    if item.owner_id == user.id {
        return true;
    }

    match operation {
        Operation::View | Operation::Update => shares
            .iter()
            .any(|share| share.item_id == item.id && share.user_id == user.id),
        Operation::Delete | Operation::Share => false,
    }
}

/// Like [`can_access`], but a denial becomes an `Authorization` error.
pub fn authorize(
    user: &User,
    item: &Item,
    shares: &[Share],
    operation: Operation,
) -> ServiceResult<()> {
    if can_access(user, item, shares, operation) {
        Ok(())
    } else {
        Err(ServiceError::Authorization(
            operation.denied_message().to_string(),
        ))
    }
}
