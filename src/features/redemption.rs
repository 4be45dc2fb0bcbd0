// Premium link redemption engine
// Quota-bounded, atomic grant of a course bundle inside one transaction

use serde_json::json;
use tracing::{info, warn};

use crate::api::firestore::{FieldTransform, FirestoreClient, Write};
use crate::error::AppError;
use crate::models::access::PremiumLink;
use crate::utils::config::paths;

/// Decision computed from the link state read inside the transaction
#[derive(Debug, Clone, PartialEq)]
pub struct RedemptionPlan {
    pub course_ids: Vec<String>,
    pub uses_after: i64,
    /// Quota reached with this use; link deactivates in the same commit
    pub deactivate: bool,
}

/// What the caller gets back after a committed redemption
#[derive(Debug, Clone)]
pub struct RedemptionOutcome {
    pub granted_course_ids: Vec<String>,
    pub uses: i64,
    pub active: bool,
}

/// Validate the link and decide the effects of one redemption.
/// Pure: all quota and boundary semantics live here.
///
/// The use that reaches exactly `max_uses` is itself permitted;
/// deactivation is a post-condition of that same commit. `max_uses == 0`
/// means unlimited and never auto-deactivates.
pub fn plan_redemption(link: Option<&PremiumLink>) -> Result<RedemptionPlan, AppError> {
    let link = link.ok_or(AppError::LinkInvalid)?;
    // Quota first: a link deactivated by exhaustion reports QuotaExhausted,
    // a manually deactivated one reports LinkInvalid
    if link.max_uses != 0 && link.uses >= link.max_uses {
        return Err(AppError::QuotaExhausted);
    }
    if !link.active {
        return Err(AppError::LinkInvalid);
    }

    let uses_after = link.uses + 1;
    Ok(RedemptionPlan {
        course_ids: link.course_ids.clone(),
        uses_after,
        deactivate: link.max_uses != 0 && uses_after >= link.max_uses,
    })
}

/// Build the write set for a planned redemption. Access grants are keyed
/// by courseId, so redeeming the same link twice upserts the same
/// documents instead of appending duplicates.
pub fn redemption_writes(plan: &RedemptionPlan, link_id: &str, uid: &str) -> Vec<Write> {
    let mut writes = Vec::with_capacity(plan.course_ids.len() + 1);

    for course_id in &plan.course_ids {
        writes.push(Write::set_with(
            paths::course_access(uid, course_id),
            json!({
                "courseId": course_id,
                "redeemedByLink": link_id,
            }),
            vec![FieldTransform::ServerTimestamp {
                field: "grantedAt".to_string(),
            }],
        ));
    }

    let link_fields = if plan.deactivate {
        json!({ "active": false })
    } else {
        json!({})
    };
    writes.push(Write::set_with(
        paths::premium_link(link_id),
        link_fields,
        vec![FieldTransform::Increment {
            field: "uses".to_string(),
            by: 1,
        }],
    ));

    writes
}

/// Redeem a link for a user. Runs as a single Firestore transaction:
/// either every grant plus the use counter commits, or nothing does.
pub async fn redeem(
    store: &FirestoreClient,
    link_id: &str,
    uid: &str,
) -> Result<RedemptionOutcome, AppError> {
    let tx = store.begin_transaction().await?;

    let link_path = paths::premium_link(link_id);
    let doc = store.get_document_in_transaction(&tx, &link_path).await?;
    let link: Option<PremiumLink> = doc.and_then(|v| serde_json::from_value(v).ok());

    let plan = match plan_redemption(link.as_ref()) {
        Ok(plan) => plan,
        Err(err) => {
            if let Err(rb_err) = store.rollback_transaction(&tx).await {
                warn!("rollback after rejected redemption failed: {}", rb_err);
            }
            return Err(err);
        }
    };

    store
        .commit(Some(&tx), redemption_writes(&plan, link_id, uid))
        .await?;

    info!(
        "user {} redeemed link {} ({} courses, use {}{})",
        uid,
        link_id,
        plan.course_ids.len(),
        plan.uses_after,
        if plan.deactivate { ", link exhausted" } else { "" }
    );

    Ok(RedemptionOutcome {
        granted_course_ids: plan.course_ids,
        uses: plan.uses_after,
        active: !plan.deactivate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testutil::{apply, docs_under, MemStore, SERVER_TIME};

    fn link(course_ids: &[&str], max_uses: i64, uses: i64, active: bool) -> PremiumLink {
        PremiumLink {
            name: "Launch bundle".into(),
            course_ids: course_ids.iter().map(|s| s.to_string()).collect(),
            max_uses,
            uses,
            active,
        }
    }

    /// Read the link state back out of the in-memory store
    fn stored_link(store: &MemStore, link_id: &str) -> PremiumLink {
        serde_json::from_value(store[&paths::premium_link(link_id)].clone()).unwrap()
    }

    /// One full redemption against the in-memory store, re-reading link
    /// state the way the transaction does
    fn redeem_mem(store: &mut MemStore, link_id: &str, uid: &str) -> Result<RedemptionPlan, AppError> {
        let link: Option<PremiumLink> = store
            .get(&paths::premium_link(link_id))
            .map(|v| serde_json::from_value(v.clone()).unwrap());
        let plan = plan_redemption(link.as_ref())?;
        apply(store, &redemption_writes(&plan, link_id, uid));
        Ok(plan)
    }

    fn seed(store: &mut MemStore, link_id: &str, l: &PremiumLink) {
        store.insert(
            paths::premium_link(link_id),
            serde_json::to_value(l).unwrap(),
        );
    }

    #[test]
    fn test_missing_or_inactive_link_is_invalid() {
        assert!(matches!(plan_redemption(None), Err(AppError::LinkInvalid)));

        let inactive = link(&["c1"], 5, 0, false);
        assert!(matches!(
            plan_redemption(Some(&inactive)),
            Err(AppError::LinkInvalid)
        ));
    }

    #[test]
    fn test_quota_boundary_last_use_succeeds() {
        // uses == max_uses - 1: the final use is permitted and deactivates
        let l = link(&["c1"], 3, 2, true);
        let plan = plan_redemption(Some(&l)).unwrap();
        assert_eq!(plan.uses_after, 3);
        assert!(plan.deactivate);

        // uses == max_uses: rejected
        let exhausted = link(&["c1"], 3, 3, true);
        assert!(matches!(
            plan_redemption(Some(&exhausted)),
            Err(AppError::QuotaExhausted)
        ));
    }

    #[test]
    fn test_unlimited_quota_never_deactivates() {
        let l = link(&["c1"], 0, 1_000_000, true);
        let plan = plan_redemption(Some(&l)).unwrap();
        assert!(!plan.deactivate);
        assert_eq!(plan.uses_after, 1_000_001);
    }

    #[test]
    fn test_redemption_grants_every_bundled_course() {
        let mut store = MemStore::new();
        seed(&mut store, "L1", &link(&["c1", "c2"], 0, 0, true));

        redeem_mem(&mut store, "L1", "u1").unwrap();

        let grants = docs_under(&store, "users/u1/courseAccess/");
        assert_eq!(grants.len(), 2);
        let c1 = &store["users/u1/courseAccess/c1"];
        assert_eq!(c1["courseId"], "c1");
        assert_eq!(c1["redeemedByLink"], "L1");
        assert_eq!(c1["grantedAt"], SERVER_TIME);
    }

    #[test]
    fn test_redeeming_twice_is_idempotent_on_grants() {
        let mut store = MemStore::new();
        seed(&mut store, "L1", &link(&["c1", "c2"], 0, 0, true));

        redeem_mem(&mut store, "L1", "u1").unwrap();
        redeem_mem(&mut store, "L1", "u1").unwrap();

        // Still exactly one grant per course, but each attempt counted
        assert_eq!(docs_under(&store, "users/u1/courseAccess/").len(), 2);
        let l = stored_link(&store, "L1");
        assert_eq!(l.uses, 2);
        assert!(l.active);
    }

    #[test]
    fn test_serialized_contention_on_max_uses_one() {
        // Two racing redemptions serialize through the transaction: the
        // second observes the committed state and fails.
        let mut store = MemStore::new();
        seed(&mut store, "L1", &link(&["c1"], 1, 0, true));

        redeem_mem(&mut store, "L1", "u1").unwrap();
        let err = redeem_mem(&mut store, "L1", "u2").unwrap_err();
        assert!(matches!(err, AppError::QuotaExhausted));

        let l = stored_link(&store, "L1");
        assert_eq!(l.uses, 1);
        assert!(!l.active);
        assert!(docs_under(&store, "users/u2/").is_empty());
    }

    #[test]
    fn test_rejected_plan_writes_nothing() {
        let mut store = MemStore::new();
        seed(&mut store, "L1", &link(&["c1"], 2, 2, true));
        let before = store.clone();

        assert!(redeem_mem(&mut store, "L1", "u1").is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn test_example_scenario_two_uses_then_exhausted() {
        // L1: courseIds=[c1,c2], maxUses=2, uses=0, active=true
        let mut store = MemStore::new();
        seed(&mut store, "L1", &link(&["c1", "c2"], 2, 0, true));

        // u1 redeems: grants for c1 and c2, uses=1, still active
        redeem_mem(&mut store, "L1", "u1").unwrap();
        assert_eq!(docs_under(&store, "users/u1/courseAccess/").len(), 2);
        let l = stored_link(&store, "L1");
        assert_eq!(l.uses, 1);
        assert!(l.active);

        // u2 redeems: uses=2, link deactivates in the same commit
        redeem_mem(&mut store, "L1", "u2").unwrap();
        let l = stored_link(&store, "L1");
        assert_eq!(l.uses, 2);
        assert!(!l.active);

        // u3 is rejected, nothing granted, uses unchanged
        assert!(redeem_mem(&mut store, "L1", "u3").is_err());
        let l = stored_link(&store, "L1");
        assert_eq!(l.uses, 2);
        assert!(docs_under(&store, "users/u3/").is_empty());
    }
}
