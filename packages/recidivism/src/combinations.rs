//! Characteristic combination generation.
//!
//! Explodes a person+event into every dimensional slice tracked for
//! reporting: the powerset of the present, included dimension values,
//! repeated per (race, ethnicity) pair for people with several recorded
//! races or ethnicities, plus a single person-level combination that is
//! never exploded further.

use std::collections::BTreeSet;

use justice_metrics_config::DimensionInclusions;
use justice_metrics_dates::whole_months_between;
use justice_metrics_entities::{Ethnicity, Person, Race};
use justice_metrics_recidivism_models::{
    AgeBucket, CharacteristicCombination, ReleaseEvent, StayLengthBucket,
};

/// Generates the full combination set for one person and one release event.
///
/// The empty combination is always present; it is the "all people"
/// aggregate. The person-level combination is appended last.
#[must_use]
pub fn characteristic_combinations(
    person: &Person,
    event: &ReleaseEvent,
    inclusions: DimensionInclusions,
) -> Vec<CharacteristicCombination> {
    let base = base_combination(person, event, inclusions);

    let races: Vec<Option<Race>> = if inclusions.race && !person.races.is_empty() {
        person.races.iter().copied().map(Some).collect()
    } else {
        vec![None]
    };
    let ethnicities: Vec<Option<Ethnicity>> =
        if inclusions.ethnicity && !person.ethnicities.is_empty() {
            person.ethnicities.iter().copied().map(Some).collect()
        } else {
            vec![None]
        };

    // The powersets for different (race, ethnicity) pairs overlap on every
    // subset that excludes both dimensions, so the union deduplicates.
    let mut unique = BTreeSet::new();
    for race in &races {
        for ethnicity in &ethnicities {
            let mut template = base.clone();
            template.race = *race;
            template.ethnicity = *ethnicity;
            unique.extend(powerset(&template));
        }
    }

    let mut combinations: Vec<CharacteristicCombination> = unique.into_iter().collect();

    let mut person_level = base;
    person_level.person_id = Some(person.person_id);
    combinations.push(person_level);

    combinations
}

fn base_combination(
    person: &Person,
    event: &ReleaseEvent,
    inclusions: DimensionInclusions,
) -> CharacteristicCombination {
    CharacteristicCombination {
        age_bucket: if inclusions.age_bucket {
            person
                .age_on(event.original_admission_date())
                .map(AgeBucket::from_age)
        } else {
            None
        },
        gender: if inclusions.gender {
            person.gender
        } else {
            None
        },
        race: None,
        ethnicity: None,
        release_facility: if inclusions.release_facility {
            event.release_facility().map(str::to_string)
        } else {
            None
        },
        stay_length_bucket: if inclusions.stay_length_bucket {
            Some(StayLengthBucket::from_months(whole_months_between(
                event.original_admission_date(),
                event.release_date(),
            )))
        } else {
            None
        },
        // The county is not inclusion-gated; it rides along whenever known.
        county_of_residence: event.county_of_residence().map(str::to_string),
        person_id: None,
    }
}

/// Every subset of the set dimensions on `template`, including the empty
/// combination.
fn powerset(template: &CharacteristicCombination) -> Vec<CharacteristicCombination> {
    let present = [
        template.age_bucket.is_some(),
        template.gender.is_some(),
        template.race.is_some(),
        template.ethnicity.is_some(),
        template.release_facility.is_some(),
        template.stay_length_bucket.is_some(),
        template.county_of_residence.is_some(),
    ];
    let set_dimensions: Vec<usize> = present
        .iter()
        .enumerate()
        .filter(|(_, set)| **set)
        .map(|(dimension, _)| dimension)
        .collect();

    let mut combinations = Vec::with_capacity(1 << set_dimensions.len());
    for mask in 0..(1_u32 << set_dimensions.len()) {
        let mut combination = template.clone();
        for (bit, dimension) in set_dimensions.iter().enumerate() {
            if mask & (1 << bit) == 0 {
                clear_dimension(&mut combination, *dimension);
            }
        }
        combinations.push(combination);
    }

    combinations
}

fn clear_dimension(combination: &mut CharacteristicCombination, dimension: usize) {
    match dimension {
        0 => combination.age_bucket = None,
        1 => combination.gender = None,
        2 => combination.race = None,
        3 => combination.ethnicity = None,
        4 => combination.release_facility = None,
        5 => combination.stay_length_bucket = None,
        _ => combination.county_of_residence = None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use justice_metrics_entities::Gender;
    use justice_metrics_recidivism_models::NonRecidivismReleaseEvent;

    use super::*;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn event(county: Option<&str>) -> ReleaseEvent {
        ReleaseEvent::NonRecidivism(NonRecidivismReleaseEvent {
            state_code: "US_XX".to_string(),
            original_admission_date: d(2005, 1, 1),
            release_date: d(2008, 1, 1),
            release_facility: Some("ALPHA".to_string()),
            county_of_residence: county.map(str::to_string),
        })
    }

    fn person(races: Vec<Race>, ethnicities: Vec<Ethnicity>) -> Person {
        Person {
            person_id: 42,
            birthdate: Some(d(1980, 6, 15)),
            gender: Some(Gender::Female),
            races,
            ethnicities,
        }
    }

    #[test]
    fn powerset_of_present_dimensions_plus_person_level() {
        // age, gender, facility, stay length set; no races/ethnicities,
        // no county.
        let combinations = characteristic_combinations(
            &person(vec![], vec![]),
            &event(None),
            DimensionInclusions::default(),
        );

        assert_eq!(combinations.len(), 16 + 1);
        assert!(combinations.contains(&CharacteristicCombination::default()));

        let person_level = combinations.last().unwrap();
        assert_eq!(person_level.person_id, Some(42));
        assert_eq!(person_level.gender, Some(Gender::Female));
        assert_eq!(person_level.race, None);
    }

    #[test]
    fn multiracial_union_deduplicates_shared_subsets() {
        let inclusions = DimensionInclusions {
            age_bucket: false,
            release_facility: false,
            stay_length_bucket: false,
            ..DimensionInclusions::default()
        };

        // Dimensions per pair: gender, race, ethnicity. Two races and one
        // ethnicity give two 8-element powersets sharing the 4 subsets
        // without a race.
        let combinations = characteristic_combinations(
            &person(vec![Race::Black, Race::White], vec![Ethnicity::NotHispanic]),
            &event(None),
            inclusions,
        );

        assert_eq!(combinations.len(), 12 + 1);
        assert!(
            combinations
                .iter()
                .any(|combination| combination.race == Some(Race::Black)
                    && combination.ethnicity == Some(Ethnicity::NotHispanic))
        );
        assert!(
            combinations
                .iter()
                .any(|combination| combination.race == Some(Race::White)
                    && combination.person_id.is_none()
                    && combination.gender.is_none())
        );
    }

    #[test]
    fn county_is_included_even_when_every_dimension_is_excluded() {
        let inclusions = DimensionInclusions {
            age_bucket: false,
            gender: false,
            race: false,
            ethnicity: false,
            release_facility: false,
            stay_length_bucket: false,
        };

        let combinations = characteristic_combinations(
            &person(vec![], vec![]),
            &event(Some("COUNTY")),
            inclusions,
        );

        // Empty, county-only, and the person-level combination.
        assert_eq!(combinations.len(), 3);
        assert!(
            combinations
                .iter()
                .any(|combination| combination.county_of_residence.as_deref() == Some("COUNTY")
                    && combination.person_id.is_none())
        );
    }

    #[test]
    fn regeneration_is_set_equal() {
        let person = person(
            vec![Race::Black, Race::AmericanIndianAlaskanNative],
            vec![Ethnicity::Hispanic, Ethnicity::NotHispanic],
        );
        let event = event(Some("COUNTY"));

        let first: BTreeSet<CharacteristicCombination> =
            characteristic_combinations(&person, &event, DimensionInclusions::default())
                .into_iter()
                .collect();
        let second: BTreeSet<CharacteristicCombination> =
            characteristic_combinations(&person, &event, DimensionInclusions::default())
                .into_iter()
                .collect();

        assert_eq!(first, second);
    }
}
