use crate::store::model::{Exercise, Location};

const LABEL_DESCRIPTION_CHARS: usize = 50;

/// An exercise fits the lesson when it can run in the chosen environment and
/// every material it needs is available.
pub fn is_available(exercise: &Exercise, environment: Location, equipment: &[String]) -> bool {
    let place_ok = exercise.location == environment || exercise.location == Location::Both;
    place_ok
        && exercise
            .materials
            .iter()
            .all(|m| equipment.iter().any(|e| e == m))
}

pub fn candidates<'a>(
    exercises: &'a [Exercise],
    environment: Location,
    equipment: &[String],
) -> Vec<&'a Exercise> {
    exercises
        .iter()
        .filter(|e| is_available(e, environment, equipment))
        .collect()
}

/// Text shown in the exercise picker.
pub fn option_label(exercise: &Exercise) -> String {
    let short: String = exercise
        .description
        .chars()
        .take(LABEL_DESCRIPTION_CHARS)
        .collect();
    format!("{} – {}...", exercise.name, short)
}
