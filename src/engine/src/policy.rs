//! Access policies and their construction-time validation

use crate::error::{DefinitionError, Result};
use crate::rule::Rule;

/// The allow side of a definition, before validation.
#[derive(Debug, Clone)]
pub enum AllowSpec {
    /// Open to every caller, authenticated or not.
    Anyone,
    /// Open to callers matching any of the rules.
    Rules(Vec<Rule>),
}

/// A validated policy: exactly one of the allow forms, or a deny list.
///
/// Definitions declare at most one side. [`AccessPolicy::from_options`] is
/// the single place that enforces this, so every value of this type is well
/// formed and evaluation never re-checks shape.
#[derive(Debug, Clone)]
pub enum AccessPolicy {
    /// Every caller is permitted, including anonymous ones.
    AllowAnyone,
    /// Callers matching any rule are permitted; everyone else is refused.
    Allow(Vec<Rule>),
    /// Callers matching any rule are refused; authenticated callers matching
    /// none are permitted. Anonymous callers are refused either way.
    Deny(Vec<Rule>),
}

impl AccessPolicy {
    /// Validates the allow/deny options of a definition.
    ///
    /// Declaring both sides or declaring an empty rule list is rejected.
    /// `Ok(None)` means neither side was declared; such a definition refuses
    /// every untrusted call and is only reachable through the trusted path.
    pub fn from_options(
        allow: Option<AllowSpec>,
        deny: Option<Vec<Rule>>,
    ) -> Result<Option<AccessPolicy>> {
        match (allow, deny) {
            (Some(_), Some(_)) => Err(DefinitionError::AllowAndDeny),
            (Some(AllowSpec::Anyone), None) => Ok(Some(AccessPolicy::AllowAnyone)),
            (Some(AllowSpec::Rules(rules)), None) => {
                if rules.is_empty() {
                    return Err(DefinitionError::EmptyRuleList { list: "allow" });
                }
                Ok(Some(AccessPolicy::Allow(rules)))
            }
            (None, Some(rules)) => {
                if rules.is_empty() {
                    return Err(DefinitionError::EmptyRuleList { list: "deny" });
                }
                Ok(Some(AccessPolicy::Deny(rules)))
            }
            (None, None) => Ok(None),
        }
    }

    /// The allow policy admitting any authenticated caller.
    pub fn logged_in() -> AccessPolicy {
        AccessPolicy::Allow(vec![Rule::logged_in()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_allow_and_deny_together() {
        let result = AccessPolicy::from_options(
            Some(AllowSpec::Rules(vec![Rule::logged_in()])),
            Some(vec![Rule::logged_in()]),
        );
        assert_eq!(result.unwrap_err(), DefinitionError::AllowAndDeny);
    }

    #[test]
    fn rejects_empty_allow_list() {
        let result = AccessPolicy::from_options(Some(AllowSpec::Rules(vec![])), None);
        assert_eq!(
            result.unwrap_err(),
            DefinitionError::EmptyRuleList { list: "allow" }
        );
    }

    #[test]
    fn rejects_empty_deny_list() {
        let result = AccessPolicy::from_options(None, Some(vec![]));
        assert_eq!(
            result.unwrap_err(),
            DefinitionError::EmptyRuleList { list: "deny" }
        );
    }

    #[test]
    fn accepts_allow_anyone() {
        let policy = AccessPolicy::from_options(Some(AllowSpec::Anyone), None).unwrap();
        assert!(matches!(policy, Some(AccessPolicy::AllowAnyone)));
    }

    #[test]
    fn accepts_missing_policy() {
        let policy = AccessPolicy::from_options(None, None).unwrap();
        assert!(policy.is_none());
    }

    #[test]
    fn accepts_deny_rules() {
        let policy = AccessPolicy::from_options(None, Some(vec![Rule::logged_in()])).unwrap();
        assert!(matches!(policy, Some(AccessPolicy::Deny(rules)) if rules.len() == 1));
    }
}
