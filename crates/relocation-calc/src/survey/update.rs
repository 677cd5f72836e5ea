use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tasks::DeferredOperations;
use crate::accessibility::{
    AccessibilityConfig, AccessibilityMapsByMode, AccessibilityService, RoutingGateway,
    RoutingTimeDistances,
};
use crate::calculations::domain::{Address, CalculationResult, ComputedField, Interview};
use crate::calculations::service::MonthlyCostService;
use crate::calculations::vehicles::OwnershipPredictor;

pub const RESULTS_SECTION: &str = "results";

/// Navigation step recorded by the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAction {
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Computed values for one address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AddressUpdate {
    #[serde(rename_all = "camelCase")]
    MonthlyCost {
        address_id: String,
        result: CalculationResult,
    },
    #[serde(rename_all = "camelCase")]
    Accessibility {
        address_id: String,
        maps: ComputedField<AccessibilityMapsByMode>,
        routing: ComputedField<RoutingTimeDistances>,
    },
}

impl AddressUpdate {
    pub fn address_id(&self) -> &str {
        match self {
            AddressUpdate::MonthlyCost { address_id, .. }
            | AddressUpdate::Accessibility { address_id, .. } => address_id,
        }
    }

    /// Dotted response paths and their new values.
    pub fn field_updates(&self) -> Vec<(String, Value)> {
        match self {
            AddressUpdate::MonthlyCost { address_id, result } => vec![(
                format!("addresses.{address_id}.monthlyCost"),
                to_value(result),
            )],
            AddressUpdate::Accessibility {
                address_id,
                maps,
                routing,
            } => vec![
                (
                    format!("addresses.{address_id}.accessibilityMapsByMode"),
                    to_value(maps),
                ),
                (
                    format!("addresses.{address_id}.routingTimeDistances"),
                    to_value(routing),
                ),
            ],
        }
    }

    pub fn apply(&self, address: &mut Address) {
        match self {
            AddressUpdate::MonthlyCost { result, .. } => address.monthly_cost = Some(result.clone()),
            AddressUpdate::Accessibility { maps, routing, .. } => {
                address.accessibility_maps_by_mode = Some(maps.clone());
                address.routing_time_distances = Some(routing.clone());
            }
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Updates produced by one pass over the results section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsUpdate {
    pub updates: Vec<AddressUpdate>,
    /// Names of the deferred accessibility operations started by this pass.
    pub scheduled: Vec<String>,
}

impl ResultsUpdate {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn field_updates(&self) -> BTreeMap<String, Value> {
        self.updates
            .iter()
            .flat_map(AddressUpdate::field_updates)
            .collect()
    }

    pub fn apply(&self, interview: &mut Interview) {
        for update in &self.updates {
            if let Some(address) = interview.addresses.get_mut(update.address_id()) {
                update.apply(address);
            }
        }
    }
}

pub fn operation_name(address_id: &str) -> String {
    format!("addressCalculations{address_id}")
}

/// Recomputes address results when the respondent reaches the results
/// section. Costs are returned immediately; accessibility is deferred.
pub struct ResultsSectionUpdater<P, G> {
    costs: Arc<MonthlyCostService<P>>,
    accessibility: Arc<AccessibilityService<G>>,
    config: AccessibilityConfig,
    operations: Option<Arc<DeferredOperations<AddressUpdate>>>,
}

impl<P, G> ResultsSectionUpdater<P, G>
where
    P: OwnershipPredictor + 'static,
    G: RoutingGateway + 'static,
{
    pub fn new(
        costs: Arc<MonthlyCostService<P>>,
        accessibility: Arc<AccessibilityService<G>>,
        config: AccessibilityConfig,
    ) -> Self {
        Self {
            costs,
            accessibility,
            config,
            operations: None,
        }
    }

    pub fn with_operations(mut self, operations: Arc<DeferredOperations<AddressUpdate>>) -> Self {
        self.operations = Some(operations);
        self
    }

    pub fn operations(&self) -> Option<&Arc<DeferredOperations<AddressUpdate>>> {
        self.operations.as_ref()
    }

    /// Runs only when the latest action entered the results section.
    pub async fn on_section_actions(
        &self,
        interview: &Interview,
        actions: &[SectionAction],
    ) -> ResultsUpdate {
        match actions.last() {
            Some(action) if action.section == RESULTS_SECTION => self.refresh(interview).await,
            _ => ResultsUpdate::default(),
        }
    }

    pub async fn refresh(&self, interview: &Interview) -> ResultsUpdate {
        let addresses = interview.addresses();
        let results = join_all(
            addresses
                .iter()
                .map(|address| self.costs.calculate(address, interview)),
        )
        .await;

        let count = addresses.len();
        let mut update = ResultsUpdate::default();
        for (address, result) in addresses.into_iter().zip(results) {
            update.updates.push(AddressUpdate::MonthlyCost {
                address_id: address.uuid.clone(),
                result,
            });

            let (maps, routing) = match self.schedule_accessibility(address, interview) {
                Some(name) => {
                    update.scheduled.push(name);
                    (ComputedField::Calculating, ComputedField::Calculating)
                }
                None => (ComputedField::Unavailable, ComputedField::Unavailable),
            };
            update.updates.push(AddressUpdate::Accessibility {
                address_id: address.uuid.clone(),
                maps,
                routing,
            });
        }

        tracing::info!(
            addresses = count,
            scheduled = update.scheduled.len(),
            "refreshed results section"
        );
        update
    }

    fn schedule_accessibility(&self, address: &Address, interview: &Interview) -> Option<String> {
        let Some(operations) = self.operations.as_ref() else {
            tracing::warn!(address_id = %address.uuid, "no operation registry, accessibility not calculated");
            return None;
        };
        if address.point().is_none() {
            tracing::warn!(address_id = %address.uuid, "address has no point geometry, accessibility not calculated");
            return None;
        }

        let name = operation_name(&address.uuid);
        let service = Arc::clone(&self.accessibility);
        let address = address.clone();
        let interview = interview.clone();
        let config = self.config.clone();
        operations.register(name.clone(), move |_cancellation| async move {
            accessibility_update(service, address, interview, config).await
        });
        Some(name)
    }
}

async fn accessibility_update<G>(
    service: Arc<AccessibilityService<G>>,
    address: Address,
    interview: Interview,
    config: AccessibilityConfig,
) -> AddressUpdate
where
    G: RoutingGateway + 'static,
{
    let calculation = service.calculate(&address, &interview, &config);
    let (maps, routing) = match AssertUnwindSafe(calculation).catch_unwind().await {
        Ok(outcome) => (
            ComputedField::from_option(outcome.accessibility_maps_by_mode),
            ComputedField::from_option(outcome.routing_time_distances),
        ),
        Err(_) => {
            tracing::error!(address_id = %address.uuid, "accessibility calculation panicked");
            (ComputedField::Unavailable, ComputedField::Unavailable)
        }
    };

    AddressUpdate::Accessibility {
        address_id: address.uuid.clone(),
        maps,
        routing,
    }
}
