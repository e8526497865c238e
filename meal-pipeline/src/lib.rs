pub mod analytics;
pub mod extract;
pub mod format;
pub mod model;
pub mod normalize;

// Re-export commonly used types
pub use analytics::{
    ConsumptionDetail, ConsumptionSummary, MealTypeStats, SkippedMeal, TimingPattern, TrackedMeal,
    TrackingStatus, analyze_consumption,
};
pub use extract::{extract, parse_meal_plan};
pub use format::{format_for_presentation, format_plan, group_by_type_and_option};
pub use model::{
    DayPlan, MealEntry, MealPlanData, MealType, ParsingMethod, PlanSummary, PresentationDay,
    PresentationPlan,
};
pub use normalize::{normalize_list, normalize_number};
