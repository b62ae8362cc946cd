// Course documents with inline reviews

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{generate_id, RatingRange};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::Document;
use crate::models::engagement::{Engageable, ModerationState};
use crate::moderation::ratings::{floor_of_mean, RatedReview, RatingAggregate};

/// Bounds shared by the three course rating dimensions.
pub const COURSE_RATING_RANGE: RatingRange = RatingRange::ONE_TO_FIVE;

/// A course. Reviews are stored inline, so every review mutation rewrites
/// the whole course document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prerequisites: String,
    #[serde(default)]
    pub exclusions: String,
    #[serde(default)]
    pub distribution: String,
    #[serde(default)]
    pub professors: Vec<String>,
    #[serde(default)]
    pub reviews: Vec<CourseReview>,
    #[serde(default)]
    pub ratings: CourseRatings,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn new(title: String, description: String) -> Self {
        Self {
            id: generate_id(),
            title,
            description,
            prerequisites: String::new(),
            exclusions: String::new(),
            distribution: String::new(),
            professors: Vec::new(),
            reviews: Vec::new(),
            ratings: CourseRatings::default(),
            created_at: Utc::now(),
        }
    }

    pub fn review_mut(&mut self, review_id: &str) -> Option<&mut CourseReview> {
        self.reviews.iter_mut().find(|r| r.id == review_id)
    }

    /// Removes the first review with the given id.
    pub fn take_review(&mut self, review_id: &str) -> Option<CourseReview> {
        let position = self.reviews.iter().position(|r| r.id == review_id)?;
        Some(self.reviews.remove(position))
    }
}

impl Document for Course {
    const COLLECTION: &'static str = "courses";
    const KIND: &'static str = "course";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseReview {
    pub id: String,
    pub content: String,
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    pub difficulty: f64,
    pub usefulness: f64,
    pub workload: f64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub moderation: ModerationState,
}

impl CourseReview {
    /// Builds a review after checking every dimension is within bounds.
    pub fn new(
        content: String,
        author_id: String,
        author_name: String,
        difficulty: f64,
        usefulness: f64,
        workload: f64,
    ) -> AppResult<Self> {
        for (name, value) in [
            ("difficulty", difficulty),
            ("usefulness", usefulness),
            ("workload", workload),
        ] {
            if !COURSE_RATING_RANGE.contains(value) {
                return Err(AppError::Validation(format!(
                    "{} must be between {} and {}, got {}",
                    name, COURSE_RATING_RANGE.min, COURSE_RATING_RANGE.max, value
                )));
            }
        }
        if content.trim().is_empty() {
            return Err(AppError::Validation("review content cannot be empty".to_string()));
        }

        Ok(Self {
            id: generate_id(),
            content,
            author_id,
            author_name,
            difficulty,
            usefulness,
            workload,
            created_at: Utc::now(),
            moderation: ModerationState::default(),
        })
    }
}

impl Engageable for CourseReview {
    fn node_kind(&self) -> &'static str {
        "course review"
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

impl RatedReview for CourseReview {
    fn rating_values(&self) -> Vec<Option<f64>> {
        vec![Some(self.difficulty), Some(self.usefulness), Some(self.workload)]
    }
}

/// Running course ratings. `overall` is the floor of the mean of the three
/// dimension means (floored, while the means themselves are rounded).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseRatings {
    pub difficulty: f64,
    pub usefulness: f64,
    pub workload: f64,
    pub overall: u32,
    pub total_reviews: u64,
}

impl RatingAggregate for CourseRatings {
    fn means(&self) -> Vec<f64> {
        vec![self.difficulty, self.usefulness, self.workload]
    }

    fn total_reviews(&self) -> u64 {
        self.total_reviews
    }

    fn apply(&mut self, means: &[f64], total_reviews: u64) {
        if let [difficulty, usefulness, workload] = means {
            self.difficulty = *difficulty;
            self.usefulness = *usefulness;
            self.workload = *workload;
        }
        self.total_reviews = total_reviews;
        self.overall = if total_reviews == 0 {
            0
        } else {
            floor_of_mean(&self.means())
        };
    }
}
