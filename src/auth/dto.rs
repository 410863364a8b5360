use bytes::Bytes;
use serde::Deserialize;
use time::Date;

/// Raw text fields of the signup form, as submitted.
#[derive(Debug, Default, Clone)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub name: String,
    pub age: String,
    pub gender: String,
    pub dob: String,
}

/// Signup fields after validation.
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub username: String,
    pub password: String,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub dob: Date,
}

/// Urlencoded body of `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// A file part of a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub body: Bytes,
}
