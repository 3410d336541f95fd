//! Faceted search over an in-memory inventory snapshot.
//!
//! The whole inventory is materialized before filtering, which keeps facet
//! computation trivial but bounds the approach to small inventories.

use std::collections::BTreeMap;

use crate::{
    dto::filter::{AvailableFilters, CarFilter, FacetCount, FilterResult, IsNewOptions, NumberRange},
    models::Car,
};

impl CarFilter {
    pub fn matches(&self, car: &Car) -> bool {
        if let Some(makes) = non_empty(&self.makes) {
            if !makes.contains(&car.make) {
                return false;
            }
        }
        if let Some(models) = non_empty(&self.models) {
            if !models.contains(&car.model) {
                return false;
            }
        }
        if let Some(from) = self.price_from {
            if !car.price.is_some_and(|price| price >= from) {
                return false;
            }
        }
        if let Some(to) = self.price_to {
            if !car.price.is_some_and(|price| price <= to) {
                return false;
            }
        }
        if let Some(colors) = non_empty(&self.colors) {
            let color = car.color.as_deref().unwrap_or("");
            if !colors.iter().any(|c| c == color) {
                return false;
            }
        }
        if let Some(max) = self.mileage_up_to {
            if !car.mileage.is_some_and(|mileage| mileage <= max) {
                return false;
            }
        }
        if let Some(from) = self.maintenance_cost_from {
            if !car.average_yearly_maintenance_cost.is_some_and(|cost| cost >= from) {
                return false;
            }
        }
        if let Some(to) = self.maintenance_cost_to {
            if !car.average_yearly_maintenance_cost.is_some_and(|cost| cost <= to) {
                return false;
            }
        }
        if let Some(from) = self.year_from {
            if !car.year.is_some_and(|year| year >= from) {
                return false;
            }
        }
        if let Some(to) = self.year_to {
            if !car.year.is_some_and(|year| year <= to) {
                return false;
            }
        }
        if let Some(is_new) = self.is_new {
            if car.is_new != Some(is_new) {
                return false;
            }
        }
        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.is_empty()) {
            // Case-sensitive on purpose.
            let hit = car.make.contains(keyword)
                || car.model.contains(keyword)
                || car.description.as_deref().is_some_and(|d| d.contains(keyword));
            if !hit {
                return false;
            }
        }
        true
    }
}

fn non_empty(values: &Option<Vec<String>>) -> Option<&Vec<String>> {
    values.as_ref().filter(|v| !v.is_empty())
}

/// Filters `inventory` and describes it.
///
/// Every facet is computed over the full inventory except `models`, which is
/// recomputed over the matching cars so it narrows with the other criteria.
pub fn apply(inventory: Vec<Car>, filter: &CarFilter) -> FilterResult {
    let makes = facet(&inventory, |car| Some(car.make.as_str()));
    let colors = facet(&inventory, |car| car.color.as_deref());
    let price_range = range(inventory.iter().filter_map(|car| car.price));
    let mileage_range = range(inventory.iter().filter_map(|car| car.mileage));
    let maintenance_cost_range =
        range(inventory.iter().filter_map(|car| car.average_yearly_maintenance_cost));
    let year_range = range(inventory.iter().filter_map(|car| car.year));
    let is_new_options = IsNewOptions {
        new: inventory.iter().any(|car| car.is_new == Some(true)),
        used: inventory.iter().any(|car| car.is_new == Some(false)),
    };

    let cars: Vec<Car> = inventory
        .into_iter()
        .filter(|car| filter.matches(car))
        .collect();
    let models = facet(&cars, |car| Some(car.model.as_str()));

    FilterResult {
        total_car_count: cars.len(),
        available_filters: AvailableFilters {
            makes,
            models,
            colors,
            price_range,
            mileage_range,
            maintenance_cost_range,
            year_range,
            is_new_options,
        },
        cars,
    }
}

fn facet<'a, F>(cars: &'a [Car], key: F) -> Vec<FacetCount>
where
    F: Fn(&'a Car) -> Option<&'a str>,
{
    let mut counts: BTreeMap<Option<&str>, usize> = BTreeMap::new();
    for car in cars {
        *counts.entry(key(car)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(key, count)| FacetCount {
            key: key.map(str::to_string),
            count,
        })
        .collect()
}

/// Min/max of the present values; both `None` when there are none.
fn range<T, I>(values: I) -> NumberRange<T>
where
    T: PartialOrd + Copy,
    I: Iterator<Item = T>,
{
    values.fold(NumberRange { min: None, max: None }, |acc, value| NumberRange {
        min: match acc.min {
            Some(min) if min <= value => Some(min),
            _ => Some(value),
        },
        max: match acc.max {
            Some(max) if max >= value => Some(max),
            _ => Some(value),
        },
    })
}
