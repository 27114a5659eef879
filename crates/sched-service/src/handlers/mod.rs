//! HTTP request handlers.

mod health;
mod meetings;
mod participants;
mod rooms;
mod verification;

pub use health::{health_check, metrics_handler, readiness_check};
pub use meetings::{
    cancel_meeting, complete_meeting, confirm_meeting, create_meeting, delete_meeting,
    get_meeting, list_meetings, list_meetings_by_room, list_meetings_by_status,
    list_meetings_in_range, reject_meeting, update_meeting, verify_batch,
};
pub use participants::{
    create_participant, delete_participant, get_participant, list_participants,
    update_participant,
};
pub use rooms::{available_slots, create_room, delete_room, get_room, list_rooms, update_room};
pub use verification::{check_pending, statistics, violations};
