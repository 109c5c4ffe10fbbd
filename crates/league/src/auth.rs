use uuid::Uuid;

use crate::error::{LeagueError, Result};

/// What a caller is allowed to do, as one tagged set of capability flags.
/// Credential verification happens upstream; operations here only consult
/// the flags.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    organizer: bool,
    captain_of: Vec<Uuid>,
    member_of: Vec<Uuid>,
}

impl Capabilities {
    pub fn organizer() -> Self {
        Self {
            organizer: true,
            ..Self::default()
        }
    }

    pub fn captain_of(squadron_id: Uuid) -> Self {
        Self {
            captain_of: vec![squadron_id],
            ..Self::default()
        }
    }

    pub fn member_of(squadron_id: Uuid) -> Self {
        Self {
            member_of: vec![squadron_id],
            ..Self::default()
        }
    }

    pub fn and_captain_of(mut self, squadron_id: Uuid) -> Self {
        self.captain_of.push(squadron_id);
        self
    }

    pub fn and_member_of(mut self, squadron_id: Uuid) -> Self {
        self.member_of.push(squadron_id);
        self
    }

    pub fn is_organizer(&self) -> bool {
        self.organizer
    }

    pub fn is_captain_of(&self, squadron_id: Uuid) -> bool {
        self.captain_of.contains(&squadron_id)
    }

    /// Captains count as members of their own squadron.
    pub fn is_member_of(&self, squadron_id: Uuid) -> bool {
        self.member_of.contains(&squadron_id) || self.is_captain_of(squadron_id)
    }
}

/// An authenticated caller: account identity plus capability set
#[derive(Debug, Clone)]
pub struct Caller {
    pub account_id: Uuid,
    pub capabilities: Capabilities,
}

impl Caller {
    pub fn new(account_id: Uuid, capabilities: Capabilities) -> Self {
        Self {
            account_id,
            capabilities,
        }
    }

    pub fn organizer(account_id: Uuid) -> Self {
        Self::new(account_id, Capabilities::organizer())
    }

    pub fn require_organizer(&self) -> Result<()> {
        if self.capabilities.is_organizer() {
            Ok(())
        } else {
            Err(LeagueError::Authorization(
                "organizer capability required".to_string(),
            ))
        }
    }

    pub fn require_captain(&self, squadron_id: Uuid) -> Result<()> {
        if self.capabilities.is_captain_of(squadron_id) {
            Ok(())
        } else {
            Err(LeagueError::Authorization(
                "squadron captain capability required".to_string(),
            ))
        }
    }

    pub fn require_member(&self, squadron_id: Uuid) -> Result<()> {
        if self.capabilities.is_member_of(squadron_id) {
            Ok(())
        } else {
            Err(LeagueError::Authorization(
                "squadron membership required".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organizer_capability() {
        let caller = Caller::organizer(Uuid::new_v4());
        assert!(caller.require_organizer().is_ok());
        assert!(caller.require_captain(Uuid::new_v4()).is_err());
    }

    #[test]
    fn captains_are_members_of_their_squadron() {
        let squadron = Uuid::new_v4();
        let caller = Caller::new(Uuid::new_v4(), Capabilities::captain_of(squadron));

        assert!(caller.require_captain(squadron).is_ok());
        assert!(caller.require_member(squadron).is_ok());
        assert!(caller.require_member(Uuid::new_v4()).is_err());
        assert!(caller.require_organizer().is_err());
    }

    #[test]
    fn membership_does_not_grant_captaincy() {
        let squadron = Uuid::new_v4();
        let caller = Caller::new(Uuid::new_v4(), Capabilities::member_of(squadron));

        assert!(caller.require_member(squadron).is_ok());
        assert!(caller.require_captain(squadron).is_err());
    }

    #[test]
    fn capability_sets_compose() {
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();
        let caps = Capabilities::organizer()
            .and_captain_of(own)
            .and_member_of(other);
        let caller = Caller::new(Uuid::new_v4(), caps);

        assert!(caller.require_organizer().is_ok());
        assert!(caller.require_captain(own).is_ok());
        assert!(caller.require_member(other).is_ok());
        assert!(caller.require_captain(other).is_err());
    }
}
