//! Expansion of a recurring creation request into a concrete series of
//! dated records.
//!
//! Recurrence here is deliberately narrow: a fixed weekly or biweekly step
//! from an anchor date up to a bound. Open-ended requests are materialized
//! against a concrete one-year horizon rather than generated lazily, so a
//! series is always a finite batch created in one shot.

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{
    DryIceOrder, EngineConfig, NewDryIceOrderData, OrderStatus, RecurrenceRequest,
};

/// Reject malformed recurrence settings before any record is built.
///
/// Bounded mode without an end date is the one representable invalid state;
/// it must fail here, never as a partial series.
pub fn validate_recurrence(request: &RecurrenceRequest) -> Result<(), CoreError> {
    if !request.open_ended && request.end_date.is_none() {
        return Err(CoreError::Validation(
            "bounded recurrence requires an end date".to_string(),
        ));
    }
    Ok(())
}

/// Reject a task time range whose end precedes its start.
pub fn validate_time_range(
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
) -> Result<(), CoreError> {
    if let (Some(start), Some(end)) = (start_time, end_time) {
        if end < start {
            return Err(CoreError::Validation(
                "end time must not precede start time".to_string(),
            ));
        }
    }
    Ok(())
}

/// The concrete last date a series may reach.
fn resolved_bound(
    anchor: NaiveDate,
    request: &RecurrenceRequest,
    config: &EngineConfig,
) -> Result<NaiveDate, CoreError> {
    if request.open_ended {
        Ok(anchor + Duration::days(config.open_ended_horizon_days))
    } else {
        request.end_date.ok_or_else(|| {
            CoreError::Validation("bounded recurrence requires an end date".to_string())
        })
    }
}

/// All occurrence dates for a series: the anchor, then one step at a time
/// while the result stays within the bound.
///
/// The sequence is strictly increasing and gap-free. A bound before the
/// anchor degenerates to the anchor alone.
pub fn occurrence_dates(
    anchor: NaiveDate,
    request: &RecurrenceRequest,
    config: &EngineConfig,
) -> Result<Vec<NaiveDate>, CoreError> {
    validate_recurrence(request)?;
    let bound = resolved_bound(anchor, request, config)?;
    let step = Duration::days(request.interval.days());

    let mut dates = vec![anchor];
    let mut next = anchor + step;
    while next <= bound {
        dates.push(next);
        next += step;
    }
    Ok(dates)
}

/// Order number for the `index`-th member of a series (index ≥ 1).
///
/// The root keeps the base number; members get a distinguishing suffix so
/// the human-readable numbers stay unique within the batch.
pub fn member_order_number(base: &str, index: usize) -> String {
    format!("{base}-{index}")
}

/// Expand a creation request into the full record batch.
///
/// A non-recurring request yields exactly one plain order. A recurring one
/// yields the series root followed by its members, all attributes copied
/// from the request, scheduled dates stepped per the recurrence settings.
/// The caller submits the batch through the bulk-create port in one shot.
pub fn expand_dry_ice_order(
    data: &NewDryIceOrderData,
    config: &EngineConfig,
) -> Result<Vec<DryIceOrder>, CoreError> {
    if data.customer_name.trim().is_empty() {
        return Err(CoreError::Validation("customer name is required".to_string()));
    }
    if !(data.quantity_kg > 0.0) {
        return Err(CoreError::Validation(
            "quantity must be greater than zero".to_string(),
        ));
    }

    let now = Utc::now();
    let recurrence = match &data.recurrence {
        None => {
            return Ok(vec![DryIceOrder {
                id: Uuid::now_v7(),
                order_number: data.order_number.clone(),
                customer_id: data.customer_id,
                customer_name: data.customer_name.trim().to_string(),
                scheduled_date: data.scheduled_date,
                quantity_kg: data.quantity_kg,
                product_type: data.product_type,
                status: OrderStatus::Pending,
                is_recurring: false,
                parent_order_id: None,
                recurrence_end_date: None,
                notes: data.notes.clone(),
                created_by: data.created_by,
                created_at: now,
                updated_at: now,
            }]);
        }
        Some(request) => request,
    };

    let dates = occurrence_dates(data.scheduled_date, recurrence, config)?;
    let root_id = Uuid::now_v7();
    // Recorded on the root only; open-ended series carry no end date.
    let recurrence_end_date = if recurrence.open_ended {
        None
    } else {
        recurrence.end_date
    };

    let orders: Vec<DryIceOrder> = dates
        .iter()
        .enumerate()
        .map(|(index, &scheduled_date)| {
            let is_root = index == 0;
            DryIceOrder {
                id: if is_root { root_id } else { Uuid::now_v7() },
                order_number: if is_root {
                    data.order_number.clone()
                } else {
                    member_order_number(&data.order_number, index)
                },
                customer_id: data.customer_id,
                customer_name: data.customer_name.trim().to_string(),
                scheduled_date,
                quantity_kg: data.quantity_kg,
                product_type: data.product_type,
                status: OrderStatus::Pending,
                is_recurring: true,
                parent_order_id: (!is_root).then_some(root_id),
                recurrence_end_date: if is_root { recurrence_end_date } else { None },
                notes: data.notes.clone(),
                created_by: data.created_by,
                created_at: now,
                updated_at: now,
            }
        })
        .collect();

    debug!(
        order_number = %data.order_number,
        instances = orders.len(),
        "expanded recurring dry-ice order"
    );
    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DryIceProductType, RecurrenceInterval};
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn base_request(scheduled: NaiveDate, recurrence: Option<RecurrenceRequest>) -> NewDryIceOrderData {
        NewDryIceOrderData {
            order_number: "DI-20250106-042".to_string(),
            customer_id: None,
            customer_name: "Cryo BV".to_string(),
            scheduled_date: scheduled,
            quantity_kg: 25.0,
            product_type: DryIceProductType::Pellets,
            notes: None,
            created_by: Uuid::now_v7(),
            recurrence,
        }
    }

    mod occurrence_tests {
        use super::*;

        #[test]
        fn test_weekly_bounded_emits_every_step_inclusive() {
            // Monday anchor, three weekly steps to the bound.
            let request = RecurrenceRequest {
                interval: RecurrenceInterval::Weekly,
                open_ended: false,
                end_date: Some(date(2025, 1, 27)),
            };
            let dates =
                occurrence_dates(date(2025, 1, 6), &request, &EngineConfig::default()).unwrap();
            assert_eq!(
                dates,
                vec![
                    date(2025, 1, 6),
                    date(2025, 1, 13),
                    date(2025, 1, 20),
                    date(2025, 1, 27),
                ]
            );
        }

        #[test]
        fn test_biweekly_steps_fourteen_days() {
            let request = RecurrenceRequest {
                interval: RecurrenceInterval::Biweekly,
                open_ended: false,
                end_date: Some(date(2025, 2, 10)),
            };
            let dates =
                occurrence_dates(date(2025, 1, 6), &request, &EngineConfig::default()).unwrap();
            assert_eq!(
                dates,
                vec![date(2025, 1, 6), date(2025, 1, 20), date(2025, 2, 3)]
            );
        }

        #[test]
        fn test_bound_before_anchor_degenerates_to_root_only() {
            let request = RecurrenceRequest {
                interval: RecurrenceInterval::Weekly,
                open_ended: false,
                end_date: Some(date(2024, 12, 1)),
            };
            let dates =
                occurrence_dates(date(2025, 1, 6), &request, &EngineConfig::default()).unwrap();
            assert_eq!(dates, vec![date(2025, 1, 6)]);
        }

        #[test]
        fn test_bounded_without_end_date_is_rejected() {
            let request = RecurrenceRequest {
                interval: RecurrenceInterval::Weekly,
                open_ended: false,
                end_date: None,
            };
            let result = occurrence_dates(date(2025, 1, 6), &request, &EngineConfig::default());
            assert!(matches!(result, Err(CoreError::Validation(_))));
        }

        #[test]
        fn test_open_ended_equals_bounded_at_horizon() {
            let anchor = date(2025, 1, 6);
            let config = EngineConfig::default();
            let open = RecurrenceRequest {
                interval: RecurrenceInterval::Weekly,
                open_ended: true,
                end_date: None,
            };
            let bounded = RecurrenceRequest {
                interval: RecurrenceInterval::Weekly,
                open_ended: false,
                end_date: Some(anchor + Duration::days(config.open_ended_horizon_days)),
            };
            assert_eq!(
                occurrence_dates(anchor, &open, &config).unwrap(),
                occurrence_dates(anchor, &bounded, &config).unwrap()
            );
        }

        proptest! {
            #[test]
            fn prop_count_matches_closed_form(
                offset_days in 0i64..420,
                biweekly in proptest::bool::ANY,
            ) {
                let anchor = date(2025, 1, 6);
                let interval = if biweekly {
                    RecurrenceInterval::Biweekly
                } else {
                    RecurrenceInterval::Weekly
                };
                let request = RecurrenceRequest {
                    interval,
                    open_ended: false,
                    end_date: Some(anchor + Duration::days(offset_days)),
                };
                let dates =
                    occurrence_dates(anchor, &request, &EngineConfig::default()).unwrap();

                let expected = (offset_days / interval.days()) as usize + 1;
                prop_assert_eq!(dates.len(), expected);

                // Strictly increasing, gap-free at the fixed step.
                for pair in dates.windows(2) {
                    prop_assert_eq!((pair[1] - pair[0]).num_days(), interval.days());
                }
                prop_assert!(dates.iter().all(|d| *d <= request.end_date.unwrap()));
            }
        }
    }

    mod expansion_tests {
        use super::*;

        #[test]
        fn test_non_recurring_request_yields_single_plain_order() {
            let data = base_request(date(2025, 3, 3), None);
            let orders = expand_dry_ice_order(&data, &EngineConfig::default()).unwrap();
            assert_eq!(orders.len(), 1);
            assert!(!orders[0].is_recurring);
            assert_eq!(orders[0].parent_order_id, None);
            assert_eq!(orders[0].order_number, "DI-20250106-042");
        }

        #[test]
        fn test_series_root_and_members_link_and_suffix() {
            let data = base_request(
                date(2025, 1, 6),
                Some(RecurrenceRequest {
                    interval: RecurrenceInterval::Weekly,
                    open_ended: false,
                    end_date: Some(date(2025, 1, 27)),
                }),
            );
            let orders = expand_dry_ice_order(&data, &EngineConfig::default()).unwrap();
            assert_eq!(orders.len(), 4);

            let root = &orders[0];
            assert!(root.is_recurring);
            assert_eq!(root.parent_order_id, None);
            assert_eq!(root.recurrence_end_date, Some(date(2025, 1, 27)));
            assert_eq!(root.order_number, "DI-20250106-042");

            for (index, member) in orders.iter().enumerate().skip(1) {
                assert_eq!(member.parent_order_id, Some(root.id));
                assert_eq!(member.recurrence_end_date, None);
                assert_eq!(
                    member.order_number,
                    format!("DI-20250106-042-{index}")
                );
                assert_eq!(member.customer_name, root.customer_name);
                assert_eq!(member.quantity_kg, root.quantity_kg);
            }

            // No two records of the batch share a date.
            let mut dates: Vec<NaiveDate> = orders.iter().map(|o| o.scheduled_date).collect();
            dates.dedup();
            assert_eq!(dates.len(), orders.len());
        }

        #[test]
        fn test_open_ended_root_records_no_end_date() {
            let data = base_request(
                date(2025, 1, 6),
                Some(RecurrenceRequest {
                    interval: RecurrenceInterval::Biweekly,
                    open_ended: true,
                    end_date: None,
                }),
            );
            let orders = expand_dry_ice_order(&data, &EngineConfig::default()).unwrap();
            assert_eq!(orders[0].recurrence_end_date, None);
            // One year at a biweekly step: 365 / 14 + the root.
            assert_eq!(orders.len(), 27);
        }

        #[test]
        fn test_invalid_quantity_rejected_before_expansion() {
            let mut data = base_request(date(2025, 1, 6), None);
            data.quantity_kg = 0.0;
            assert!(matches!(
                expand_dry_ice_order(&data, &EngineConfig::default()),
                Err(CoreError::Validation(_))
            ));
        }
    }

    mod time_range_tests {
        use super::*;

        #[test]
        fn test_end_before_start_rejected() {
            let start = NaiveTime::from_hms_opt(14, 0, 0);
            let end = NaiveTime::from_hms_opt(9, 0, 0);
            assert!(matches!(
                validate_time_range(start, end),
                Err(CoreError::Validation(_))
            ));
        }

        #[test]
        fn test_open_or_ordered_ranges_accepted() {
            let nine = NaiveTime::from_hms_opt(9, 0, 0);
            let five = NaiveTime::from_hms_opt(17, 0, 0);
            assert!(validate_time_range(nine, five).is_ok());
            assert!(validate_time_range(nine, None).is_ok());
            assert!(validate_time_range(None, five).is_ok());
            assert!(validate_time_range(None, None).is_ok());
        }
    }
}
