use super::{ReviewField, ReviewSchema};
use crate::workflows::review::domain::ReviewType;

/// Answers to "would you like to see this applicant in the organization?".
pub const FIT_IN_ORGANIZATION: [&str; 4] = ["DEFINITELY", "YES", "MAYBE", "NO"];

/// Scoring sheet used for membership applications.
pub fn membership_schema() -> ReviewSchema {
    ReviewSchema::new(
        ReviewType::membership(),
        vec![
            ReviewField::score("motivation", "Motivation", 1, 5),
            ReviewField::score("skill", "Skill", 1, 5),
            ReviewField::score("fit", "Overall fit", 1, 5),
            ReviewField::one_of("in_tumai", "Fit in TUM.ai?", &FIT_IN_ORGANIZATION)
                .required_with("fit in tumai is required"),
            ReviewField::free_text("comment_fit_tumai", "Tum.ai fit comment"),
            ReviewField::free_text("timecommit", "Time commitment"),
            ReviewField::score("dept1_score", "Department 1 score", 1, 5)
                .required_with("Add a score for department 1"),
            ReviewField::score("dept2_score", "Department 2 score", 1, 5)
                .required_with("Add a score for department 2"),
            ReviewField::score("dept3_score", "Department 3 score", 1, 5)
                .required_with("Add a score for department 3"),
            ReviewField::free_text("maybegoodfit", "Good fit?"),
            ReviewField::free_text("furthercomments", "Further comments"),
        ],
    )
}
