//! Per-group baseline evaluation and the overall go/no-go assessment.

use crate::data::{AnimalRecord, Recommendation, RecommendationLevel};
use crate::error::Result;
use crate::homogeneity::score::{
    homogeneity_score, HomogeneityThresholds, Quality, SMALL_GROUP,
};
use crate::stats::{basic_stats, group_by};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Baseline homogeneity of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupHomogeneityResult {
    pub group_name: String,
    /// Number of animals with a valid baseline.
    pub n: usize,
    /// Number of animals in the group.
    pub animal_count: usize,
    pub has_baseline: bool,
    /// Valid (positive, finite) baselines in animal order.
    pub baseline_values: Vec<f64>,
    pub mean: f64,
    pub std_dev: f64,
    /// Coefficient of variation, percent.
    pub cv: f64,
    pub homogeneity_score: f64,
    pub quality: Quality,
}

/// Whether the cohort is fit for growth modeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudyRecommendation {
    Proceed,
    Caution,
    Review,
}

impl StudyRecommendation {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Proceed => "PROCEED",
            Self::Caution => "CAUTION",
            Self::Review => "REVIEW",
        }
    }
}

impl std::fmt::Display for StudyRecommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Assessment across all groups with a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallAssessment {
    /// Mean CV across groups with a baseline.
    pub mean_cv: f64,
    /// Mean score across groups with a baseline.
    pub mean_score: f64,
    /// Quality label of the mean CV.
    pub quality: Quality,
    pub recommendation: StudyRecommendation,
    /// Number of groups that contributed.
    pub groups_assessed: usize,
}

/// Result of [`evaluate_homogeneity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomogeneityReport {
    pub total_animals: usize,
    pub total_groups: usize,
    pub group_analysis: Vec<GroupHomogeneityResult>,
    pub overall_assessment: OverallAssessment,
    pub recommendations: Vec<Recommendation>,
    pub thresholds: HomogeneityThresholds,
}

impl HomogeneityReport {
    /// Get a group's result by name.
    pub fn get_group(&self, name: &str) -> Option<&GroupHomogeneityResult> {
        self.group_analysis.iter().find(|g| g.group_name == name)
    }
}

impl std::fmt::Display for HomogeneityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Baseline Homogeneity")?;
        writeln!(f, "====================")?;
        writeln!(
            f,
            "{} animals in {} groups",
            self.total_animals, self.total_groups
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<16} {:>4} {:>10} {:>8} {:>7}  Quality",
            "Group", "n", "Mean", "CV%", "Score"
        )?;
        for g in &self.group_analysis {
            writeln!(
                f,
                "{:<16} {:>4} {:>10.1} {:>8.1} {:>7.1}  {}",
                g.group_name, g.n, g.mean, g.cv, g.homogeneity_score, g.quality
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Overall: CV {:.1}%, score {:.1} ({}) => {}",
            self.overall_assessment.mean_cv,
            self.overall_assessment.mean_score,
            self.overall_assessment.quality,
            self.overall_assessment.recommendation
        )?;
        for rec in &self.recommendations {
            writeln!(f, "  {}", rec)?;
        }
        Ok(())
    }
}

fn evaluate_group(
    name: String,
    members: &[&AnimalRecord],
    thresholds: &HomogeneityThresholds,
) -> GroupHomogeneityResult {
    let baseline_values: Vec<f64> = members
        .iter()
        .filter_map(|a| a.baseline())
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();

    if baseline_values.is_empty() {
        return GroupHomogeneityResult {
            group_name: name,
            n: 0,
            animal_count: members.len(),
            has_baseline: false,
            baseline_values,
            mean: 0.0,
            std_dev: 0.0,
            cv: 0.0,
            homogeneity_score: 0.0,
            quality: Quality::Insufficient,
        };
    }

    let stats = basic_stats(&baseline_values);
    let cv = if stats.mean > 0.0 {
        stats.std / stats.mean * 100.0
    } else {
        0.0
    };
    GroupHomogeneityResult {
        group_name: name,
        n: stats.count,
        animal_count: members.len(),
        has_baseline: true,
        mean: stats.mean,
        std_dev: stats.std,
        cv,
        homogeneity_score: homogeneity_score(cv, stats.count, thresholds),
        quality: thresholds.quality(cv),
        baseline_values,
    }
}

/// The overall recommendation follows the worst group as well as the mean:
/// a single poor group forces REVIEW even when the mean CV looks acceptable.
fn assess(
    groups: &[GroupHomogeneityResult],
    thresholds: &HomogeneityThresholds,
) -> OverallAssessment {
    let assessed: Vec<&GroupHomogeneityResult> = groups.iter().filter(|g| g.has_baseline).collect();
    if assessed.is_empty() {
        return OverallAssessment {
            mean_cv: 0.0,
            mean_score: 0.0,
            quality: Quality::Insufficient,
            recommendation: StudyRecommendation::Review,
            groups_assessed: 0,
        };
    }

    let k = assessed.len() as f64;
    let mean_cv = assessed.iter().map(|g| g.cv).sum::<f64>() / k;
    let mean_score = assessed.iter().map(|g| g.homogeneity_score).sum::<f64>() / k;
    let worst = assessed
        .iter()
        .map(|g| g.quality)
        .max()
        .unwrap_or(Quality::Excellent);

    let recommendation = if mean_cv > thresholds.good || worst == Quality::Poor {
        StudyRecommendation::Review
    } else if mean_cv > thresholds.excellent || worst == Quality::Fair {
        StudyRecommendation::Caution
    } else {
        StudyRecommendation::Proceed
    };

    OverallAssessment {
        mean_cv,
        mean_score,
        quality: thresholds.quality(mean_cv),
        recommendation,
        groups_assessed: assessed.len(),
    }
}

fn recommendations(
    groups: &[GroupHomogeneityResult],
    overall: &OverallAssessment,
    thresholds: &HomogeneityThresholds,
) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    match overall.recommendation {
        StudyRecommendation::Review => recs.push(Recommendation::new(
            RecommendationLevel::Error,
            "overall",
            "Baseline Review Required",
            format!(
                "Baseline variability (mean CV {:.1}%) is too high for reliable growth \
                 comparisons. Review randomization before modeling.",
                overall.mean_cv
            ),
        )),
        StudyRecommendation::Caution => recs.push(Recommendation::new(
            RecommendationLevel::Warning,
            "overall",
            "Moderate Baseline Variability",
            format!(
                "Mean baseline CV is {:.1}%. Growth comparisons are possible but \
                 consider baseline-adjusted analyses.",
                overall.mean_cv
            ),
        )),
        StudyRecommendation::Proceed => {}
    }

    for group in groups.iter().filter(|g| g.has_baseline && g.cv > thresholds.good) {
        recs.push(Recommendation::new(
            RecommendationLevel::Warning,
            "group",
            "High Baseline Variability",
            format!(
                "Group {} has a baseline CV of {:.1}% (threshold {:.0}%).",
                group.group_name, group.cv, thresholds.good
            ),
        ));
    }

    let small: Vec<String> = groups
        .iter()
        .filter(|g| g.has_baseline && g.n < SMALL_GROUP)
        .map(|g| format!("{} (n={})", g.group_name, g.n))
        .collect();
    if !small.is_empty() {
        recs.push(Recommendation::new(
            RecommendationLevel::Info,
            "sample_size",
            "Small Groups",
            format!(
                "Groups with fewer than {} animals have reduced scores: {}.",
                SMALL_GROUP,
                small.join(", ")
            ),
        ));
    }

    if recs.is_empty() {
        recs.push(Recommendation::new(
            RecommendationLevel::Success,
            "overall",
            "Ready for Modeling",
            "Baseline measurements are homogeneous across groups. The study is ready for \
             growth modeling.",
        ));
    }

    recs
}

/// Evaluate baseline homogeneity per group.
///
/// Groups keep first-appearance order. Each animal's baseline is its day-0
/// measurement, or its first measurement when day 0 is absent. Fails only
/// if `thresholds` are invalid.
pub fn evaluate_homogeneity(
    animals: &[AnimalRecord],
    thresholds: &HomogeneityThresholds,
) -> Result<HomogeneityReport> {
    thresholds.validate()?;

    let group_analysis: Vec<GroupHomogeneityResult> =
        group_by(animals.iter(), |a| a.group.clone())
            .into_iter()
            .map(|(name, members)| evaluate_group(name, &members, thresholds))
            .collect();
    let overall_assessment = assess(&group_analysis, thresholds);
    let recommendations = recommendations(&group_analysis, &overall_assessment, thresholds);

    info!(
        animals = animals.len(),
        groups = group_analysis.len(),
        mean_cv = overall_assessment.mean_cv,
        recommendation = overall_assessment.recommendation.name(),
        "homogeneity evaluation complete"
    );

    Ok(HomogeneityReport {
        total_animals: animals.len(),
        total_groups: group_analysis.len(),
        group_analysis,
        overall_assessment,
        recommendations,
        thresholds: *thresholds,
    })
}
