/// Interaction governor
///
/// Anonymous sessions get a fixed number of assistant calls; signing in
/// lifts the ceiling. The counter itself lives in the session state and is
/// advanced by the pipeline only after a successful model round-trip, so a
/// failed call never costs a query.

/// Admission decision for one assistant call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny,
}

pub fn admit(is_authenticated: bool, used: u32, limit: u32) -> Admission {
    if !is_authenticated && used >= limit {
        Admission::Deny
    } else {
        Admission::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_denied_at_limit() {
        assert_eq!(admit(false, 5, 5), Admission::Deny);
        assert_eq!(admit(false, 6, 5), Admission::Deny);
    }

    #[test]
    fn test_guest_allowed_below_limit() {
        assert_eq!(admit(false, 0, 5), Admission::Allow);
        assert_eq!(admit(false, 4, 5), Admission::Allow);
    }

    #[test]
    fn test_authenticated_always_allowed() {
        assert_eq!(admit(true, 5, 5), Admission::Allow);
        assert_eq!(admit(true, 10_000, 5), Admission::Allow);
    }
}
