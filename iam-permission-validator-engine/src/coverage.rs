//! Statement coverage engine
//!
//! Given the statements granted to a principal and a required policy document,
//! works out which required (action, resource, condition) triples are not
//! covered. For each required resource:
//!
//! 1. Every Allow grant whose resources match the resource and whose actions
//!    match at least one required action is considered. If its condition
//!    block does not cover the required condition, a condition miss is
//!    recorded and the grant contributes nothing; otherwise the actions it
//!    matches are covered.
//! 2. An action is missing when any Deny grant matches both the resource and
//!    the action, whatever the Allow grants say.
//! 3. Actions left uncovered are reported as missing, except those a
//!    condition miss already reports.
//!
//! Output order follows the input: required statement, then resource, then
//! action order within each entry.

use itertools::Itertools;
use log::debug;
use std::collections::HashSet;

use crate::condition::covers;
use crate::errors::{Result, ValidatorError};
use crate::pattern::Pattern;
use crate::policy::{
    Condition, ConditionMap, Effect, GrantedPolicy, GrantedStatement, PolicyDocument,
    StatementEntry,
};

/// One uncovered requirement
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Missing {
    /// Actions not allowed on a resource
    Actions {
        /// Uncovered actions, in required order
        actions: Vec<String>,
        /// Required resource
        resource: String,
        /// Name of the required policy
        policy: String,
    },
    /// A grant allows the actions without applying the required condition
    Condition {
        /// The required condition
        condition: Condition,
        /// All actions of the required statement
        actions: Vec<String>,
        /// Required resource
        resource: String,
        /// Name of the required policy
        policy: String,
    },
}

impl Missing {
    /// Render this entry as a failure message
    ///
    /// `rule_type_name` and `principal` only appear in missing-action
    /// messages.
    #[must_use]
    pub fn describe(&self, rule_type_name: &str, principal: &str) -> String {
        match self {
            Self::Actions {
                actions,
                resource,
                policy,
            } => format!(
                "{rule_type_name} {principal} missing action(s): [{}] for resource {resource} from policy {policy}",
                actions.join(" ")
            ),
            Self::Condition {
                condition,
                actions,
                resource,
                policy,
            } => format!(
                "Condition {}: {}=[{}] not applied to action(s) [{}] for resource {resource} from policy {policy}",
                condition.condition_type,
                condition.key,
                condition.values.join(" "),
                actions.join(" ")
            ),
        }
    }
}

#[derive(Debug)]
struct CompiledStatement {
    actions: Vec<Pattern>,
    resources: Vec<Pattern>,
    condition: Option<ConditionMap>,
}

impl CompiledStatement {
    fn compile(origin: &str, statement: &GrantedStatement) -> Result<Self> {
        let compile_all = |patterns: &[String]| {
            patterns
                .iter()
                .map(|p| {
                    Pattern::new(p).map_err(|e| {
                        ValidatorError::malformed_policy(origin, format!("invalid pattern '{p}': {e}"))
                    })
                })
                .collect::<Result<Vec<_>>>()
        };

        Ok(Self {
            actions: compile_all(&statement.actions)?,
            resources: compile_all(&statement.resources)?,
            condition: statement.condition.clone(),
        })
    }

    fn matches_resource(&self, resource: &str) -> bool {
        self.resources.iter().any(|p| p.is_match(resource))
    }

    fn matches_action(&self, action: &str) -> bool {
        self.actions.iter().any(|p| p.is_match(action))
    }
}

/// The granted statements of one principal, split by effect and compiled
///
/// Insertion order is kept, so results are a function of input order alone.
#[derive(Debug, Default)]
pub struct GrantSet {
    allows: Vec<CompiledStatement>,
    denies: Vec<CompiledStatement>,
}

impl GrantSet {
    /// Create an empty grant set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grant set from loose statements
    ///
    /// # Errors
    /// Returns [`ValidatorError::MalformedPolicy`] if a pattern cannot be
    /// compiled.
    pub fn from_statements<'a>(
        statements: impl IntoIterator<Item = &'a GrantedStatement>,
    ) -> Result<Self> {
        let mut grants = Self::new();
        for statement in statements {
            grants.add_statement("inline statements", statement)?;
        }
        Ok(grants)
    }

    /// Add every statement of a decoded managed policy
    ///
    /// # Errors
    /// Returns [`ValidatorError::MalformedPolicy`] naming `origin` if a
    /// pattern cannot be compiled. Nothing from the policy is added then.
    pub fn add_policy(&mut self, origin: &str, policy: &GrantedPolicy) -> Result<()> {
        let compiled = policy
            .statements
            .iter()
            .map(|s| CompiledStatement::compile(origin, s).map(|c| (s.effect, c)))
            .collect::<Result<Vec<_>>>()?;

        for (effect, statement) in compiled {
            self.push(effect, statement);
        }
        Ok(())
    }

    /// Add one granted statement
    ///
    /// # Errors
    /// Returns [`ValidatorError::MalformedPolicy`] if a pattern cannot be
    /// compiled.
    pub fn add_statement(&mut self, origin: &str, statement: &GrantedStatement) -> Result<()> {
        let compiled = CompiledStatement::compile(origin, statement)?;
        self.push(statement.effect, compiled);
        Ok(())
    }

    fn push(&mut self, effect: Effect, statement: CompiledStatement) {
        match effect {
            Effect::Allow => self.allows.push(statement),
            Effect::Deny => self.denies.push(statement),
        }
    }

    /// Number of granted statements
    #[must_use]
    pub fn len(&self) -> usize {
        self.allows.len() + self.denies.len()
    }

    /// Whether no statements were granted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find everything in `required` these grants do not cover
    ///
    /// Identical condition misses are reported once.
    #[must_use]
    pub fn missing_for_policy(&self, required: &PolicyDocument) -> Vec<Missing> {
        let mut seen_conditions = HashSet::new();
        let missing: Vec<Missing> = required
            .statements
            .iter()
            .flat_map(|statement| self.missing_for_statement(&required.name, statement))
            .filter(|entry| match entry {
                Missing::Condition { .. } => seen_conditions.insert(entry.clone()),
                Missing::Actions { .. } => true,
            })
            .collect();

        debug!(
            "Required policy {}: {} statement(s), {} uncovered entr(ies) against {} grant(s)",
            required.name,
            required.statements.len(),
            missing.len(),
            self.len()
        );
        missing
    }

    /// Find what one required statement of `policy_name` is missing
    #[must_use]
    pub fn missing_for_statement(
        &self,
        policy_name: &str,
        statement: &StatementEntry,
    ) -> Vec<Missing> {
        let mut missing = Vec::new();

        for resource in &statement.resources {
            let mut covered = vec![false; statement.actions.len()];
            let mut reported_by_condition = vec![false; statement.actions.len()];

            for grant in self.allows.iter().filter(|g| g.matches_resource(resource)) {
                let matched = statement
                    .actions
                    .iter()
                    .positions(|action| grant.matches_action(action))
                    .collect::<Vec<_>>();
                if matched.is_empty() {
                    continue;
                }

                if !covers(grant.condition.as_ref(), statement.condition.as_ref()) {
                    // an unconditioned requirement simply gets nothing from this grant
                    if let Some(condition) = &statement.condition {
                        missing.push(Missing::Condition {
                            condition: condition.clone(),
                            actions: statement.actions.clone(),
                            resource: resource.clone(),
                            policy: policy_name.to_string(),
                        });
                        for i in matched {
                            reported_by_condition[i] = true;
                        }
                    }
                    continue;
                }

                for i in matched {
                    covered[i] = true;
                }
            }

            let uncovered = statement
                .actions
                .iter()
                .enumerate()
                .filter(|(i, action)| {
                    self.is_denied(resource, action)
                        || (!covered[*i] && !reported_by_condition[*i])
                })
                .map(|(_, action)| action.clone())
                .collect::<Vec<_>>();

            if !uncovered.is_empty() {
                missing.push(Missing::Actions {
                    actions: uncovered,
                    resource: resource.clone(),
                    policy: policy_name.to_string(),
                });
            }
        }

        missing
    }

    fn is_denied(&self, resource: &str, action: &str) -> bool {
        self.denies
            .iter()
            .any(|deny| deny.matches_resource(resource) && deny.matches_action(action))
    }
}
