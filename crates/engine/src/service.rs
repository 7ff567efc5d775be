//! The editing-session service.
//!
//! Owns the session and the rule repository, executes commands, and talks
//! to the async rule-data source. Spell fetches are tagged with the class
//! active when issued; a response that arrives after the session moved on
//! is discarded rather than applied.

use std::sync::Arc;

use async_trait::async_trait;

use sheetforge_domain::payload::{self, CharacterProfile};
use sheetforge_domain::resolve::derive;
use sheetforge_domain::{CharacterSelections, DerivedCharacterState, DomainError, RuleRepository};

use crate::commands::{apply, Command, CommandOutcome};
use crate::content::{CatalogImporter, RawCatalog, RawSpell};
use crate::error::CommandError;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Rule data source unavailable: {0}")]
    Unavailable(String),
}

/// Async port to the rule-data repository.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleDataSource: Send + Sync {
    async fn fetch_catalog(&self) -> Result<RawCatalog, FetchError>;
    async fn fetch_class_spells(&self, class_id: &str) -> Result<Vec<RawSpell>, FetchError>;
}

/// Tag for an in-flight spell fetch: the epoch and class active at issue
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellFetch {
    epoch: u64,
    pub class_id: String,
}

pub struct SessionService {
    session: CharacterSelections,
    rules: RuleRepository,
    source: Arc<dyn RuleDataSource>,
    importer: CatalogImporter,
    spell_epoch: u64,
}

impl SessionService {
    pub fn new(source: Arc<dyn RuleDataSource>) -> Self {
        Self::with_rules(source, RuleRepository::new())
    }

    /// Start with a pre-populated repository (tests, embedded catalogs).
    pub fn with_rules(source: Arc<dyn RuleDataSource>, rules: RuleRepository) -> Self {
        Self {
            session: CharacterSelections::new(),
            rules,
            source,
            importer: CatalogImporter::default(),
            spell_epoch: 0,
        }
    }

    pub fn session(&self) -> &CharacterSelections {
        &self.session
    }

    pub fn rules(&self) -> &RuleRepository {
        &self.rules
    }

    pub fn derived(&self) -> DerivedCharacterState {
        derive(&self.session, &self.rules)
    }

    /// Discard the current session and start empty at level 0.
    pub fn new_character(&mut self) {
        self.session = CharacterSelections::new();
        self.spell_epoch += 1;
    }

    /// Replace the session with one rehydrated from a saved profile.
    pub fn load(&mut self, profile: &CharacterProfile) -> Result<DerivedCharacterState, DomainError> {
        self.session = payload::restore(profile)?;
        self.spell_epoch += 1;
        Ok(self.derived())
    }

    /// Fetch and install the reference catalog. On failure the built-in
    /// defaults stay in place; dependent derivations re-run once data
    /// arrives because derived state is always computed from the current
    /// repository.
    pub async fn load_catalog(&mut self) {
        match self.source.fetch_catalog().await {
            Ok(raw) => match self.importer.import_into(&mut self.rules, raw) {
                Ok(summary) => {
                    tracing::info!(
                        imported = summary.imported,
                        dropped = summary.dropped,
                        "Rule catalog installed"
                    );
                }
                Err(err) => tracing::warn!(error = %err, "Catalog import failed"),
            },
            Err(err) => {
                tracing::warn!(error = %err, "Catalog fetch failed; keeping built-in defaults");
            }
        }
    }

    /// Execute one command. A class change triggers a fresh spell fetch for
    /// the new class before the outcome is returned.
    pub async fn execute(&mut self, command: Command) -> Result<CommandOutcome, CommandError> {
        let class_changed = matches!(command, Command::ChooseClass(_));
        let mut outcome = apply(&mut self.session, &self.rules, command)?;
        if class_changed {
            self.refresh_spells().await;
            outcome.derived = self.derived();
        }
        Ok(outcome)
    }

    /// Tag a spell fetch for the active class. Issuing a new tag makes
    /// every earlier one stale.
    pub fn begin_spell_fetch(&mut self) -> Option<SpellFetch> {
        let class_id = self.session.class_id.clone()?;
        self.spell_epoch += 1;
        Some(SpellFetch {
            epoch: self.spell_epoch,
            class_id,
        })
    }

    /// Apply a fetch response. Stale tags (a newer fetch was issued, or the
    /// session switched class) are discarded; a failed fetch leaves the
    /// spell list empty rather than stale. Returns whether the response was
    /// applied.
    pub fn complete_spell_fetch(
        &mut self,
        fetch: SpellFetch,
        result: Result<Vec<RawSpell>, FetchError>,
    ) -> bool {
        if fetch.epoch != self.spell_epoch
            || self.session.class_id.as_deref() != Some(fetch.class_id.as_str())
        {
            tracing::debug!(class = %fetch.class_id, "Discarding stale spell catalog response");
            return false;
        }
        match result {
            Ok(raw) => {
                let spells = self.importer.import_spells(raw);
                tracing::info!(class = %fetch.class_id, count = spells.len(), "Spell catalog installed");
                self.rules.set_class_spells(&fetch.class_id, spells);
                true
            }
            Err(err) => {
                tracing::warn!(
                    class = %fetch.class_id,
                    error = %err,
                    "Spell fetch failed; leaving the list empty"
                );
                self.rules.clear_class_spells(&fetch.class_id);
                false
            }
        }
    }

    async fn refresh_spells(&mut self) {
        if let Some(fetch) = self.begin_spell_fetch() {
            let result = self.source.fetch_class_spells(&fetch.class_id).await;
            self.complete_spell_fetch(fetch, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetforge_domain::testing::fixtures;

    fn spell_rows() -> Vec<RawSpell> {
        vec![
            RawSpell {
                name: "Druidcraft".into(),
                level: 0,
            },
            RawSpell {
                name: "Cure Wounds".into(),
                level: 1,
            },
        ]
    }

    #[tokio::test]
    async fn class_change_fetches_the_new_class_spell_list() {
        let mut source = MockRuleDataSource::new();
        source
            .expect_fetch_class_spells()
            .withf(|class_id| class_id == "druid")
            .times(1)
            .returning(|_| Ok(spell_rows()));
        let mut service =
            SessionService::with_rules(Arc::new(source), fixtures::sample_rules());

        service
            .execute(Command::ChooseClass("druid".into()))
            .await
            .expect("known class");
        let spells = service.rules().class_spells("druid").expect("installed");
        assert_eq!(spells.len(), 2);
        assert_eq!(spells[1].id, "cure wounds");
    }

    #[tokio::test]
    async fn stale_spell_responses_are_discarded() {
        let mut source = MockRuleDataSource::new();
        source
            .expect_fetch_class_spells()
            .returning(|_| Ok(Vec::new()));
        let mut service =
            SessionService::with_rules(Arc::new(source), fixtures::sample_rules());

        service
            .execute(Command::ChooseClass("druid".into()))
            .await
            .expect("known class");
        let stale = service.begin_spell_fetch().expect("class chosen");

        // The user switches classes before the response lands.
        service
            .execute(Command::ChooseClass("fighter".into()))
            .await
            .expect("known class");
        assert!(!service.complete_spell_fetch(stale, Ok(spell_rows())));
        // The discarded response never replaced the empty druid list.
        assert_eq!(
            service.rules().class_spells("druid").map(<[_]>::len),
            Some(0)
        );
    }

    #[tokio::test]
    async fn failed_fetches_leave_the_spell_list_empty_not_stale() {
        let mut source = MockRuleDataSource::new();
        source
            .expect_fetch_class_spells()
            .returning(|_| Ok(spell_rows()));
        let mut service =
            SessionService::with_rules(Arc::new(source), fixtures::sample_rules());
        service
            .execute(Command::ChooseClass("druid".into()))
            .await
            .expect("known class");
        assert!(service.rules().class_spells("druid").is_some());

        let fetch = service.begin_spell_fetch().expect("class chosen");
        let applied = service.complete_spell_fetch(
            fetch,
            Err(FetchError::Unavailable("offline".into())),
        );
        assert!(!applied);
        assert!(service.rules().class_spells("druid").is_none());
    }

    #[tokio::test]
    async fn catalog_fetch_failure_keeps_built_in_defaults() {
        let mut source = MockRuleDataSource::new();
        source
            .expect_fetch_catalog()
            .times(1)
            .returning(|| Err(FetchError::Unavailable("offline".into())));
        let mut service = SessionService::new(Arc::new(source));

        service.load_catalog().await;
        // The fallback array still serves an empty repository.
        assert_eq!(
            service.rules().standard_array_for("druid"),
            [10, 12, 14, 8, 15, 13]
        );
        assert_eq!(service.derived().armor_class, 10);
    }

    #[tokio::test]
    async fn load_replaces_the_session_and_rederives() {
        let mut source = MockRuleDataSource::new();
        source
            .expect_fetch_class_spells()
            .returning(|_| Ok(spell_rows()));
        let rules = fixtures::sample_rules();
        let session = fixtures::druid_session(&rules, 3);
        let profile = payload::build(&session, &derive(&session, &rules));

        let mut service = SessionService::with_rules(Arc::new(source), rules);
        let derived = service.load(&profile).expect("valid payload");
        assert_eq!(derived.hit_dice_total, 3);
        assert_eq!(service.session().class_id.as_deref(), Some("druid"));
    }
}
