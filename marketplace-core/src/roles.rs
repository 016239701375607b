//! Append-only role sets
//!
//! Administrators and store owners are granted, never revoked. Membership
//! checks are O(1); enumeration preserves insertion order, which is the
//! order the presentation layer renders.

use crate::types::Principal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Growth-only set of principals with insertion-order enumeration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleSet {
    members: HashSet<Principal>,
    order: Vec<Principal>,
}

impl RoleSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership check
    pub fn contains(&self, principal: &Principal) -> bool {
        self.members.contains(principal)
    }

    /// Add a principal; returns false if already a member
    pub fn grant(&mut self, principal: Principal) -> bool {
        if !self.members.insert(principal.clone()) {
            return false;
        }
        self.order.push(principal);
        true
    }

    /// Members in insertion order
    pub fn as_slice(&self) -> &[Principal] {
        &self.order
    }

    /// Member count
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if no members
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_and_contains() {
        let mut roles = RoleSet::new();
        let alice = Principal::new("alice");

        assert!(!roles.contains(&alice));
        assert!(roles.grant(alice.clone()));
        assert!(roles.contains(&alice));
        assert_eq!(roles.len(), 1);
    }

    #[test]
    fn test_duplicate_grant_rejected() {
        let mut roles = RoleSet::new();
        let bob = Principal::new("bob");

        assert!(roles.grant(bob.clone()));
        assert!(!roles.grant(bob.clone()));
        assert_eq!(roles.len(), 1);
    }

    #[test]
    fn test_enumeration_preserves_insertion_order() {
        let mut roles = RoleSet::new();
        for name in ["a2", "a0", "a1"] {
            roles.grant(Principal::new(name));
        }

        let names: Vec<&str> = roles.as_slice().iter().map(Principal::as_str).collect();
        assert_eq!(names, vec!["a2", "a0", "a1"]);
    }
}
