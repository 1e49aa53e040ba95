pub mod requests;
pub mod responses;

pub use requests::{
    ChallengesRequest, FullProfileRequest, Gender, GoalsRequest, JsonRequest, MeansRequest,
    StrengthsRequest,
};
pub use responses::{ApiResponse, FullProfileData, Goal, Mean};
