use nom::{
    character::complete::digit1,
    combinator::{all_consuming, map_res},
    error::Error as NomError,
    number::complete::recognize_float,
    Parser,
};

use crate::error::SurveyError;
use crate::models::CommonParams;

/// Project setup as typed by the operator.
#[derive(Clone, Debug, Default, PartialEq, uniffi::Record)]
pub struct SetupForm {
    pub name: String,
    pub transcat: String,
    pub interstation: String,
    pub average_resistivity: String,
    pub intercoil: String,
}

/// Validated project setup.
#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct ProjectSetup {
    pub name: String,
    pub common: CommonParams,
}

/// Parse and validate every setup field. Nothing is committed on failure.
pub fn parse_setup(form: &SetupForm) -> Result<ProjectSetup, SurveyError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(SurveyError::validation("name", "is required"));
    }

    let common = CommonParams {
        transcat: parse_field("transcat", &form.transcat, integer)?,
        interstation: parse_field("interstation", &form.interstation, decimal)?,
        average_resistivity: parse_field(
            "averageResistivity",
            &form.average_resistivity,
            decimal,
        )?,
        intercoil: parse_field("intercoil", &form.intercoil, decimal)?,
    };
    common.validate()?;

    Ok(ProjectSetup {
        name: name.to_string(),
        common,
    })
}

#[uniffi::export]
pub fn validate_setup(form: SetupForm) -> Result<ProjectSetup, SurveyError> {
    parse_setup(&form)
}

fn parse_field<'a, O, P>(field: &str, raw: &'a str, parser: P) -> Result<O, SurveyError>
where
    P: Parser<&'a str, Output = O, Error = NomError<&'a str>>,
{
    let input = raw.trim();
    if input.is_empty() {
        return Err(SurveyError::validation(field, "is required"));
    }

    if let Ok((_, value)) = all_consuming(parser).parse(input) {
        return Ok(value);
    }
    let message = match all_consuming(decimal).parse(input) {
        Ok((_, value)) if value.is_sign_negative() => {
            format!("'{input}' must not be negative")
        }
        Ok(_) if input.bytes().all(|b| b.is_ascii_digit()) => {
            format!("'{input}' is out of range")
        }
        Ok(_) => format!("'{input}' must be a whole number"),
        Err(_) => format!("'{input}' is not a number"),
    };
    Err(SurveyError::validation(field, message))
}

fn integer(input: &str) -> nom::IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>()).parse(input)
}

fn decimal(input: &str) -> nom::IResult<&str, f64> {
    map_res(recognize_float, |s: &str| s.parse::<f64>()).parse(input)
}
