use lazy_static::lazy_static;
use regex::Regex;
use time::{macros::format_description, Date};

use crate::{
    auth::dto::{SignupForm, ValidSignup},
    error::AppError,
};

const NAME_MAX: usize = 100;
const GENDER_MAX: usize = 10;

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^\S{4,20}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

pub(crate) fn is_valid_password(password: &str) -> bool {
    (4..=20).contains(&password.chars().count())
}

pub(crate) fn check_credentials_shape(username: &str, password: &str) -> Result<(), AppError> {
    if !is_valid_username(username) {
        return Err(AppError::validation(
            "Username must be 4 to 20 characters with no spaces.",
        ));
    }
    if !is_valid_password(password) {
        return Err(AppError::validation("Password must be 4 to 20 characters."));
    }
    Ok(())
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(AppError::validation(format!("{field} is required.")));
    }
    Ok(v)
}

pub(crate) fn parse_dob(raw: &str) -> Result<Date, AppError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::validation("Date of birth must be a date like 1990-04-23."))
}

pub fn validate_signup(form: SignupForm) -> Result<ValidSignup, AppError> {
    check_credentials_shape(&form.username, &form.password)?;

    let name = required(&form.name, "Name")?;
    if name.chars().count() > NAME_MAX {
        return Err(AppError::validation(format!(
            "Name must be at most {NAME_MAX} characters."
        )));
    }

    let age = required(&form.age, "Age")?
        .parse::<i32>()
        .ok()
        .filter(|a| *a > 0)
        .ok_or_else(|| AppError::validation("Age must be a positive whole number."))?;

    let gender = required(&form.gender, "Gender")?;
    if gender.chars().count() > GENDER_MAX {
        return Err(AppError::validation(format!(
            "Gender must be at most {GENDER_MAX} characters."
        )));
    }

    let dob = parse_dob(required(&form.dob, "Date of birth")?)?;

    Ok(ValidSignup {
        name: name.to_string(),
        gender: gender.to_string(),
        username: form.username,
        password: form.password,
        age,
        dob,
    })
}
