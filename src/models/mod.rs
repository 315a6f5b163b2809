pub mod assignment;
pub mod cv;
pub mod requests;
pub mod station;

pub use assignment::{AssignmentRecord, AssignmentState, StationRef, StationSummary};
pub use cv::{Cv, CvView, RotationalAssignment, RotationalStatus};
pub use requests::{AssignMultipleRequest, AssignRequest, RemoveRequest, RotateRequest, StationPlan};
pub use station::Station;
