#![allow(dead_code)]

use bloodlink_db::Database;
use bloodlink_db::models::NewUser;
use bloodlink_types::models::{BloodRequest, NewBloodRequest, Principal};
use bloodlink_types::{Coordinate, Role};
use tempfile::TempDir;

pub fn test_db() -> (TempDir, Database) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = Database::open(&tmp.path().join("bloodlink-test.db")).expect("open db");
    (tmp, db)
}

pub fn register(db: &Database, role: Role, email: &str, location: Option<Coordinate>) -> Principal {
    let profile = db
        .create_user(&NewUser {
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role,
            name: format!("{} {}", role, email),
            blood_group: Some("O+".to_string()),
            location,
        })
        .expect("create user");
    Principal {
        user_id: profile.id,
        role,
    }
}

pub fn donor(db: &Database, email: &str) -> Principal {
    register(db, Role::Donor, email, Some(Coordinate::new(0.0, 0.0)))
}

pub fn hospital_at(db: &Database, email: &str, lat: f64, lng: f64) -> Principal {
    register(db, Role::Hospital, email, Some(Coordinate::new(lat, lng)))
}

pub fn open_request(db: &Database, hospital: &Principal, persons: i64) -> BloodRequest {
    db.create_request(
        hospital,
        NewBloodRequest {
            blood_type: "O+".to_string(),
            persons,
            notes: None,
        },
    )
    .expect("create request")
}
