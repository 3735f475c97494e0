//! Partner directory management.

use std::sync::Arc;

use mockable::Clock;
use pagination::Paginated;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::listing::{ADMIN_PAGE_LIMITS, PageQuery, find_page};
use crate::domain::ports::{Condition, DocumentStore, Filter, SortOrder};
use crate::domain::repository::Repository;
use crate::domain::{Error, NewPartner, Partner, PartnerKind, PartnerPatch};

/// Partner listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    pub kind: Option<PartnerKind>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

impl PartnerQuery {
    fn filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(kind) = self.kind {
            filter = filter.with("kind", Condition::Equals(json!(kind)));
        }
        if let Some(active) = self.is_active {
            filter = filter.with("isActive", Condition::Equals(Value::Bool(active)));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            filter = filter.with_any(
                ["name", "email", "phone"]
                    .map(|field| (field, Condition::ContainsText(search.to_owned()))),
            );
        }
        filter
    }
}

fn normalise_email(email: Option<String>) -> Option<String> {
    email
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
}

#[derive(Clone)]
pub struct PartnerService {
    partners: Repository<Partner>,
    clock: Arc<dyn Clock>,
}

impl PartnerService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            partners: Repository::new(store),
            clock,
        }
    }

    /// Partners sorted by name.
    pub async fn list(&self, query: PartnerQuery) -> Result<Paginated<Partner>, Error> {
        let request = query.page.request(ADMIN_PAGE_LIMITS)?;
        find_page(&self.partners, &query.filter(), ("name", SortOrder::Asc), request).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Partner, Error> {
        self.partners.require(id).await
    }

    pub async fn create(&self, input: NewPartner) -> Result<Partner, Error> {
        let now = self.clock.utc();
        let partner = Partner {
            id: Uuid::new_v4(),
            name: input.name,
            kind: input.kind,
            email: normalise_email(input.email),
            phone: input.phone,
            notes: input.notes,
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        self.partners.insert(&partner).await?;
        Ok(partner)
    }

    pub async fn update(&self, id: Uuid, mut patch: PartnerPatch) -> Result<Partner, Error> {
        let mut partner = self.partners.require(id).await?;
        patch.email = normalise_email(patch.email);
        patch.apply(&mut partner);
        partner.updated_at = self.clock.utc();
        self.partners.replace(&partner).await?;
        Ok(partner)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), Error> {
        self.partners.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorKind;
    use crate::outbound::persistence::MemoryDocumentStore;
    use crate::test_support::MutableClock;
    use rstest::{fixture, rstest};

    #[fixture]
    fn service() -> PartnerService {
        PartnerService::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MutableClock::at_test_epoch()),
        )
    }

    fn new_partner(name: &str, kind: PartnerKind, email: Option<&str>, active: bool) -> NewPartner {
        NewPartner {
            name: name.to_owned(),
            kind,
            email: email.map(str::to_owned),
            phone: None,
            notes: None,
            is_active: Some(active),
        }
    }

    async fn seed_directory(service: &PartnerService) {
        for partner in [
            new_partner("Moto Depot", PartnerKind::Dealer, Some("sales@motodepot.example"), true),
            new_partner("Wrench Works", PartnerKind::Mechanic, Some("shop@wrench.example"), true),
            new_partner("Old Haulers", PartnerKind::Transport, None, false),
        ] {
            service.create(partner).await.expect("seed partner");
        }
    }

    fn names(page: &Paginated<Partner>) -> Vec<&str> {
        page.items.iter().map(|partner| partner.name.as_str()).collect()
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_is_a_conflict_in_any_case(service: PartnerService) {
        service
            .create(new_partner("Moto Depot", PartnerKind::Dealer, Some("sales@motodepot.example"), true))
            .await
            .expect("first partner");

        let err = service
            .create(new_partner("Depot Two", PartnerKind::Dealer, Some(" Sales@MotoDepot.example "), true))
            .await
            .expect_err("email already used");

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.message(), "email already exists");
    }

    #[rstest]
    #[tokio::test]
    async fn partners_without_email_never_collide(service: PartnerService) {
        for name in ["First", "Second"] {
            service
                .create(new_partner(name, PartnerKind::Other, Some("  "), true))
                .await
                .expect("blank email is dropped");
        }
    }

    #[rstest]
    #[case::kind(PartnerQuery { kind: Some(PartnerKind::Mechanic), ..PartnerQuery::default() }, &["Wrench Works"])]
    #[case::inactive(PartnerQuery { is_active: Some(false), ..PartnerQuery::default() }, &["Old Haulers"])]
    #[case::active(PartnerQuery { is_active: Some(true), ..PartnerQuery::default() }, &["Moto Depot", "Wrench Works"])]
    #[case::search_name(PartnerQuery { search: Some("HAUL".to_owned()), ..PartnerQuery::default() }, &["Old Haulers"])]
    #[case::search_email(PartnerQuery { search: Some("@wrench".to_owned()), ..PartnerQuery::default() }, &["Wrench Works"])]
    #[case::combined(PartnerQuery { kind: Some(PartnerKind::Dealer), search: Some("wrench".to_owned()), ..PartnerQuery::default() }, &[])]
    #[tokio::test]
    async fn list_applies_every_filter(
        service: PartnerService,
        #[case] query: PartnerQuery,
        #[case] expected: &[&str],
    ) {
        seed_directory(&service).await;

        let page = service.list(query).await.expect("list partners");

        assert_eq!(names(&page), expected);
        assert_eq!(page.pagination.total, expected.len() as u64);
    }

    #[rstest]
    #[tokio::test]
    async fn update_normalises_the_email(service: PartnerService) {
        let partner = service
            .create(new_partner("Moto Depot", PartnerKind::Dealer, None, true))
            .await
            .expect("create partner");

        let updated = service
            .update(
                partner.id,
                PartnerPatch {
                    email: Some(" Parts@MotoDepot.example ".to_owned()),
                    ..PartnerPatch::default()
                },
            )
            .await
            .expect("update partner");

        assert_eq!(updated.email.as_deref(), Some("parts@motodepot.example"));
    }
}
