//! Constants used throughout the Synapse core crate.
//!
//! Collection names, environment defaults and the fixed option lists offered to patients.

use crate::models::AppointmentStatus;

/// Default database identifier when none is configured.
pub const DEFAULT_DATABASE_ID: &str = "synapse";

/// Default collection holding signed-up users.
pub const DEFAULT_USERS_COLLECTION_ID: &str = "users";

/// Default collection holding patient intake records.
pub const DEFAULT_PATIENTS_COLLECTION_ID: &str = "patients";

/// Default collection holding appointments.
pub const DEFAULT_APPOINTMENTS_COLLECTION_ID: &str = "appointments";

/// Gender options offered on the intake form.
pub const GENDER_OPTIONS: [&str; 3] = ["Male", "Female", "Other"];

/// Identification documents accepted during registration.
pub const IDENTIFICATION_TYPES: [&str; 11] = [
    "Birth Certificate",
    "Driver's License",
    "Medical Insurance Card/Policy",
    "Military ID Card",
    "National Identity Card",
    "Passport",
    "Resident Alien Card (Green Card)",
    "Social Security Card",
    "State ID Card",
    "Student ID Card",
    "Voter ID Card",
];

/// A physician patients can book with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Doctor {
    pub name: &'static str,
    pub image: &'static str,
}

pub static DOCTORS: [Doctor; 9] = [
    Doctor {
        name: "Abhinav Verma",
        image: "/assets/images/dr-green.png",
    },
    Doctor {
        name: "Priya Sharma",
        image: "/assets/images/dr-cameron.png",
    },
    Doctor {
        name: "Tejas Patel",
        image: "/assets/images/dr-livingston.png",
    },
    Doctor {
        name: "Kartik Srinivasan",
        image: "/assets/images/dr-peter.png",
    },
    Doctor {
        name: "Nina Gupta",
        image: "/assets/images/dr-powell.png",
    },
    Doctor {
        name: "Rohan Mehta",
        image: "/assets/images/dr-remirez.png",
    },
    Doctor {
        name: "Sana Khan",
        image: "/assets/images/dr-lee.png",
    },
    Doctor {
        name: "Anjali Desai",
        image: "/assets/images/dr-cruz.png",
    },
    Doctor {
        name: "Hardik Sharma",
        image: "/assets/images/dr-sharma.png",
    },
];

/// Looks up a doctor on the roster by exact name.
pub fn find_doctor(name: &str) -> Option<&'static Doctor> {
    DOCTORS.iter().find(|doctor| doctor.name == name)
}

/// Icon shown next to an appointment status, if the status is one of the known three.
pub fn status_icon(status: &AppointmentStatus) -> Option<&'static str> {
    match status {
        AppointmentStatus::Scheduled => Some("/assets/icons/check.svg"),
        AppointmentStatus::Pending => Some("/assets/icons/pending.svg"),
        AppointmentStatus::Cancelled => Some("/assets/icons/cancelled.svg"),
        AppointmentStatus::Other(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_options() {
        assert_eq!(GENDER_OPTIONS, ["Male", "Female", "Other"]);
    }

    #[test]
    fn test_identification_types_include_common_documents() {
        assert!(IDENTIFICATION_TYPES.contains(&"Passport"));
        assert!(IDENTIFICATION_TYPES.contains(&"Driver's License"));
    }

    #[test]
    fn test_find_doctor() {
        let doctor = find_doctor("Nina Gupta").expect("should be on the roster");
        assert_eq!(doctor.image, "/assets/images/dr-powell.png");
        assert!(find_doctor("Dr. Nobody").is_none());
    }

    #[test]
    fn test_status_icon_only_for_known_statuses() {
        assert_eq!(
            status_icon(&AppointmentStatus::Pending),
            Some("/assets/icons/pending.svg")
        );
        assert_eq!(status_icon(&AppointmentStatus::Other("noshow".into())), None);
    }
}
