// Professor documents and standalone professor reviews

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{generate_id, RatingRange};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::Document;
use crate::models::engagement::{Engageable, ModerationState};
use crate::moderation::ratings::{RatedReview, RatingAggregate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professor {
    pub id: String,
    pub name: String,
    pub department: String,
    #[serde(default)]
    pub profile_link: Option<String>,
    #[serde(default)]
    pub current_courses: Vec<String>,
    #[serde(default)]
    pub past_courses: Vec<String>,
    #[serde(default)]
    pub ratings: ProfessorRatings,
    pub created_at: DateTime<Utc>,
}

impl Professor {
    pub fn new(name: String, department: String) -> AppResult<Self> {
        for (field, value) in [("name", &name), ("department", &department)] {
            let len = value.trim().chars().count();
            if !(3..=100).contains(&len) {
                return Err(AppError::Validation(format!(
                    "{} must be between 3 and 100 characters",
                    field
                )));
            }
        }
        Ok(Self {
            id: generate_id(),
            name,
            department,
            profile_link: None,
            current_courses: Vec::new(),
            past_courses: Vec::new(),
            ratings: ProfessorRatings::default(),
            created_at: Utc::now(),
        })
    }
}

impl Document for Professor {
    const COLLECTION: &'static str = "professors";
    const KIND: &'static str = "professor";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Submitted scores for a professor review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfessorScores {
    /// 1–5, required.
    pub overall_rating: f64,
    /// Whole number 1–10 when present.
    pub strictness: Option<f64>,
    pub clarity: Option<f64>,
    pub engagement: Option<f64>,
}

impl ProfessorScores {
    pub fn validate(&self) -> AppResult<()> {
        if !RatingRange::ONE_TO_FIVE.contains(self.overall_rating) {
            return Err(AppError::Validation(format!(
                "overall_rating must be between 1 and 5, got {}",
                self.overall_rating
            )));
        }
        for (name, value) in [
            ("strictness", self.strictness),
            ("clarity", self.clarity),
            ("engagement", self.engagement),
        ] {
            if let Some(v) = value {
                if !RatingRange::ONE_TO_TEN.contains(v) {
                    return Err(AppError::Validation(format!(
                        "{} must be between 1 and 10, got {}",
                        name, v
                    )));
                }
            }
        }
        if let Some(strictness) = self.strictness {
            if strictness.fract() != 0.0 {
                return Err(AppError::Validation(format!(
                    "strictness must be a whole number, got {}",
                    strictness
                )));
            }
        }
        Ok(())
    }
}

/// A review of a professor. Stored as its own document and linked to the
/// professor by id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessorReview {
    pub id: String,
    pub professor_id: String,
    #[serde(default)]
    pub course_id: Option<String>,
    pub content: String,
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(flatten)]
    pub scores: ProfessorScores,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub moderation: ModerationState,
}

impl ProfessorReview {
    pub fn new(
        professor_id: String,
        course_id: Option<String>,
        content: String,
        author_id: String,
        author_name: String,
        scores: ProfessorScores,
    ) -> AppResult<Self> {
        scores.validate()?;
        if content.trim().is_empty() {
            return Err(AppError::Validation("review content cannot be empty".to_string()));
        }
        Ok(Self {
            id: generate_id(),
            professor_id,
            course_id,
            content,
            author_id,
            author_name,
            scores,
            created_at: Utc::now(),
            moderation: ModerationState::default(),
        })
    }
}

impl Document for ProfessorReview {
    const COLLECTION: &'static str = "professor_reviews";
    const KIND: &'static str = "professor review";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Engageable for ProfessorReview {
    fn node_kind(&self) -> &'static str {
        "professor review"
    }

    fn node_id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.author_id
    }

    fn moderation(&self) -> &ModerationState {
        &self.moderation
    }

    fn moderation_mut(&mut self) -> &mut ModerationState {
        &mut self.moderation
    }
}

impl RatedReview for ProfessorReview {
    fn rating_values(&self) -> Vec<Option<f64>> {
        vec![
            Some(self.scores.overall_rating),
            self.scores.strictness,
            self.scores.clarity,
            self.scores.engagement,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfessorRatings {
    pub overall: f64,
    pub strictness: f64,
    pub clarity: f64,
    pub engagement: f64,
    pub total_reviews: u64,
}

impl RatingAggregate for ProfessorRatings {
    fn means(&self) -> Vec<f64> {
        vec![self.overall, self.strictness, self.clarity, self.engagement]
    }

    fn total_reviews(&self) -> u64 {
        self.total_reviews
    }

    fn apply(&mut self, means: &[f64], total_reviews: u64) {
        if let [overall, strictness, clarity, engagement] = means {
            self.overall = *overall;
            self.strictness = *strictness;
            self.clarity = *clarity;
            self.engagement = *engagement;
        }
        self.total_reviews = total_reviews;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::ratings::on_insert;
    use serde_json::json;

    fn scores(overall: f64, clarity: Option<f64>) -> ProfessorScores {
        ProfessorScores {
            overall_rating: overall,
            strictness: None,
            clarity,
            engagement: None,
        }
    }

    #[test]
    fn test_score_bounds() {
        assert!(scores(5.0, Some(10.0)).validate().is_ok());
        assert!(scores(0.5, None).validate().is_err());
        assert!(scores(3.0, Some(11.0)).validate().is_err());
    }

    #[test]
    fn test_strictness_must_be_whole() {
        let mut s = scores(4.0, None);
        s.strictness = Some(7.0);
        assert!(s.validate().is_ok());
        s.strictness = Some(7.5);
        assert!(matches!(s.validate(), Err(AppError::Validation(ref m)) if m.contains("whole")));
        s.strictness = Some(10.5);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_short_name_rejected() {
        assert!(Professor::new("Al".into(), "Computer Science".into()).is_err());
    }

    #[test]
    fn test_review_flat_shape() {
        let review = ProfessorReview::new(
            "prof".into(),
            None,
            "great".into(),
            "u1".into(),
            "alice".into(),
            scores(4.0, Some(8.0)),
        )
        .unwrap();
        let value = serde_json::to_value(&review).unwrap();
        assert_eq!(value["overall_rating"], json!(4.0));
        assert_eq!(value["clarity"], json!(8.0));
        assert_eq!(value["likes"], json!([]));
    }

    #[test]
    fn test_omitted_dimension_pulls_toward_zero() {
        let mut ratings = ProfessorRatings::default();
        let with = ProfessorReview::new("p".into(), None, "a".into(), "u1".into(), "a".into(), scores(4.0, Some(8.0))).unwrap();
        let without = ProfessorReview::new("p".into(), None, "b".into(), "u2".into(), "b".into(), scores(4.0, None)).unwrap();
        on_insert(&mut ratings, &with);
        on_insert(&mut ratings, &without);
        assert_eq!(ratings.overall, 4.0);
        assert_eq!(ratings.clarity, 4.0);
        assert_eq!(ratings.total_reviews, 2);
    }
}
