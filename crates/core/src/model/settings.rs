use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseSettingsError {
    #[error("age must be > 0")]
    InvalidAge,

    #[error("attempt limit must be > 0")]
    InvalidAttemptLimit,

    #[error("details threshold must be a percentage between 0 and 100")]
    InvalidDetailsThreshold,
}

//
// ─── ENUMERATED FIELDS ─────────────────────────────────────────────────────────
//

/// Support level the exercise is tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutismLevel {
    Level1,
    Level2,
    Level3,
}

impl AutismLevel {
    /// Wire/display form, e.g. "Level 1".
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AutismLevel::Level1 => "Level 1",
            AutismLevel::Level2 => "Level 2",
            AutismLevel::Level3 => "Level 3",
        }
    }
}

impl fmt::Display for AutismLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering style requested for generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageStyle {
    Realistic,
    Illustration,
    Cartoon,
    Watercolor,
    ThreeDRendering,
}

impl ImageStyle {
    /// Wire/display form, e.g. "3D Rendering".
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStyle::Realistic => "Realistic",
            ImageStyle::Illustration => "Illustration",
            ImageStyle::Cartoon => "Cartoon",
            ImageStyle::Watercolor => "Watercolor",
            ImageStyle::ThreeDRendering => "3D Rendering",
        }
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display label for how demanding the generated scene should be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    VerySimple,
    Simple,
    Moderate,
    Detailed,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::VerySimple => "Very Simple",
            Difficulty::Simple => "Simple",
            Difficulty::Moderate => "Moderate",
            Difficulty::Detailed => "Detailed",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Typed configuration for one description exercise.
///
/// Controls image generation inputs and the per-image attempt budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSettings {
    age: u8,
    autism_level: AutismLevel,
    topic_focus: String,
    treatment_plan: String,
    image_style: ImageStyle,
    difficulty: Difficulty,
    attempt_limit: u32,
    details_threshold: f64,
}

impl ExerciseSettings {
    /// Creates the caregiver-form defaults: age 3, Level 1, realistic style,
    /// 3 attempts per image, 70% details threshold.
    #[must_use]
    pub fn default_profile() -> Self {
        Self {
            age: 3,
            autism_level: AutismLevel::Level1,
            topic_focus: String::new(),
            treatment_plan: String::new(),
            image_style: ImageStyle::Realistic,
            difficulty: Difficulty::VerySimple,
            attempt_limit: 3,
            details_threshold: 70.0,
        }
    }

    /// Creates custom exercise settings.
    ///
    /// # Errors
    ///
    /// Returns an error when age or the attempt limit is zero, or the
    /// details threshold falls outside 0..=100.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        age: u8,
        autism_level: AutismLevel,
        topic_focus: impl Into<String>,
        treatment_plan: impl Into<String>,
        image_style: ImageStyle,
        difficulty: Difficulty,
        attempt_limit: u32,
        details_threshold: f64,
    ) -> Result<Self, ExerciseSettingsError> {
        if age == 0 {
            return Err(ExerciseSettingsError::InvalidAge);
        }
        if attempt_limit == 0 {
            return Err(ExerciseSettingsError::InvalidAttemptLimit);
        }
        if !details_threshold.is_finite() || !(0.0..=100.0).contains(&details_threshold) {
            return Err(ExerciseSettingsError::InvalidDetailsThreshold);
        }

        let topic_focus = topic_focus.into().trim().to_owned();
        let treatment_plan = treatment_plan.into().trim().to_owned();

        Ok(Self {
            age,
            autism_level,
            topic_focus,
            treatment_plan,
            image_style,
            difficulty,
            attempt_limit,
            details_threshold,
        })
    }

    // Accessors
    #[must_use]
    pub fn age(&self) -> u8 {
        self.age
    }

    #[must_use]
    pub fn autism_level(&self) -> AutismLevel {
        self.autism_level
    }

    #[must_use]
    pub fn topic_focus(&self) -> &str {
        &self.topic_focus
    }

    #[must_use]
    pub fn treatment_plan(&self) -> &str {
        &self.treatment_plan
    }

    #[must_use]
    pub fn image_style(&self) -> ImageStyle {
        self.image_style
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn attempt_limit(&self) -> u32 {
        self.attempt_limit
    }

    #[must_use]
    pub fn details_threshold(&self) -> f64 {
        self.details_threshold
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_valid() {
        let settings = ExerciseSettings::default_profile();
        assert_eq!(settings.age(), 3);
        assert_eq!(settings.autism_level(), AutismLevel::Level1);
        assert_eq!(settings.image_style(), ImageStyle::Realistic);
        assert_eq!(settings.difficulty(), Difficulty::VerySimple);
        assert_eq!(settings.attempt_limit(), 3);
        assert!((settings.details_threshold() - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn new_rejects_zero_attempt_limit() {
        let err = ExerciseSettings::new(
            3,
            AutismLevel::Level1,
            "farm animals",
            "",
            ImageStyle::Cartoon,
            Difficulty::VerySimple,
            0,
            70.0,
        )
        .unwrap_err();
        assert_eq!(err, ExerciseSettingsError::InvalidAttemptLimit);
    }

    #[test]
    fn new_rejects_out_of_range_threshold() {
        for threshold in [-1.0, 100.5, f64::NAN, f64::INFINITY] {
            let err = ExerciseSettings::new(
                3,
                AutismLevel::Level1,
                "",
                "",
                ImageStyle::Realistic,
                Difficulty::VerySimple,
                3,
                threshold,
            )
            .unwrap_err();
            assert_eq!(err, ExerciseSettingsError::InvalidDetailsThreshold);
        }
    }

    #[test]
    fn new_rejects_zero_age() {
        let err = ExerciseSettings::new(
            0,
            AutismLevel::Level2,
            "",
            "",
            ImageStyle::Realistic,
            Difficulty::VerySimple,
            3,
            70.0,
        )
        .unwrap_err();
        assert_eq!(err, ExerciseSettingsError::InvalidAge);
    }

    #[test]
    fn new_trims_free_text_fields() {
        let settings = ExerciseSettings::new(
            5,
            AutismLevel::Level3,
            "  zoo animals  ",
            "  focus on colors  ",
            ImageStyle::Watercolor,
            Difficulty::Simple,
            5,
            50.0,
        )
        .unwrap();
        assert_eq!(settings.topic_focus(), "zoo animals");
        assert_eq!(settings.treatment_plan(), "focus on colors");
    }

    #[test]
    fn boundary_thresholds_are_accepted() {
        for threshold in [0.0, 100.0] {
            assert!(
                ExerciseSettings::new(
                    3,
                    AutismLevel::Level1,
                    "",
                    "",
                    ImageStyle::Realistic,
                    Difficulty::VerySimple,
                    1,
                    threshold,
                )
                .is_ok()
            );
        }
    }

    #[test]
    fn wire_labels_match_gateway_vocabulary() {
        assert_eq!(AutismLevel::Level2.as_str(), "Level 2");
        assert_eq!(ImageStyle::ThreeDRendering.as_str(), "3D Rendering");
        assert_eq!(Difficulty::VerySimple.as_str(), "Very Simple");
    }
}
