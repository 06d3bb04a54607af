use std::collections::BTreeMap;
use std::str::FromStr;

use ethers::abi::{Constructor, ParamType, Token};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::error::DeployError;

pub const DEFAULT_ADMIN_ADDRESS: &str =
    "0x1FCAC2Ed5ceb3E54F7239E9e5ACCB1C9Ccc062C1";
pub const DEFAULT_TREASURY_ADDRESS: &str =
    "0x1FCAC2Ed5ceb3E54F7239E9e5ACCB1C9Ccc062C1";
pub const DEFAULT_FUEL_TOKEN_ADDRESS: &str =
    "0x83b090759017EFC9cB4d9E45B813f5D5CbBFeb95";
pub const DEFAULT_FUEL_RATE: u64 = 6_300_000_000_000_000;

/// The named marketplace constructor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum NamedParameter {
    AdminAddress,
    TreasuryAddress,
    FuelTokenAddress,
    FuelRate,
}

impl NamedParameter {
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::AdminAddress => &["adminAddress", "admin"],
            Self::TreasuryAddress => &["treasuryAddress", "treasury"],
            Self::FuelTokenAddress => {
                &["fuelTokenAddress", "FUELAddress", "fuelAddress", "fuel"]
            }
            Self::FuelRate => &["fuelRate"],
        }
    }

    fn matches(self, name: &str) -> bool {
        let name = normalize(name);
        self.aliases().iter().any(|alias| normalize(alias) == name)
    }

    fn lookup(name: &str) -> Option<Self> {
        Self::iter().find(|param| param.matches(name))
    }
}

fn normalize(name: &str) -> String {
    name.trim().trim_start_matches('_').to_ascii_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ParameterValue {
    #[display(fmt = "{:?}", _0)]
    Address(Address),
    #[display(fmt = "{}", _0)]
    Uint(U256),
    /// Not yet typed, coerced against the declared constructor input type.
    #[display(fmt = "{}", _0)]
    Raw(String),
}

/// An address-like string: `0x` followed by exactly 40 hex digits.
pub fn parse_address(name: &str, value: &str) -> Result<Address, DeployError> {
    let value = value.trim();

    let is_well_formed = value.len() == 42
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit());

    if !is_well_formed {
        return Err(DeployError::ParameterBinding(format!(
            "`{name}` is not a 20 byte hex address: `{value}`"
        )));
    }

    Address::from_str(value).map_err(|err| {
        DeployError::ParameterBinding(format!("`{name}`: {err}"))
    })
}

fn parse_uint(name: &str, value: &str) -> Result<U256, DeployError> {
    let value = value.trim().replace('_', "");

    let parsed = match value.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).ok(),
        None => U256::from_dec_str(&value).ok(),
    };

    parsed.ok_or_else(|| {
        DeployError::ParameterBinding(format!(
            "`{name}` is not an unsigned integer: `{value}`"
        ))
    })
}

/// Constructor arguments of the marketplace, by name.
///
/// Every field has a default; overrides come from the configuration file and
/// `--param key=value` flags. Keys that do not name one of the marketplace
/// parameters are kept in `extra` and still have to match the artifact's
/// constructor when binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentParameterSet {
    pub admin_address: Address,
    pub treasury_address: Address,
    pub fuel_token_address: Address,
    pub fuel_rate: U256,
    pub extra: BTreeMap<String, String>,
}

impl Default for DeploymentParameterSet {
    fn default() -> Self {
        Self {
            admin_address: Address::from_str(DEFAULT_ADMIN_ADDRESS)
                .unwrap_or_default(),
            treasury_address: Address::from_str(DEFAULT_TREASURY_ADDRESS)
                .unwrap_or_default(),
            fuel_token_address: Address::from_str(DEFAULT_FUEL_TOKEN_ADDRESS)
                .unwrap_or_default(),
            fuel_rate: U256::from(DEFAULT_FUEL_RATE),
            extra: BTreeMap::new(),
        }
    }
}

impl DeploymentParameterSet {
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), DeployError> {
        match NamedParameter::lookup(key) {
            Some(NamedParameter::AdminAddress) => {
                self.admin_address = parse_address(key, value)?;
            }
            Some(NamedParameter::TreasuryAddress) => {
                self.treasury_address = parse_address(key, value)?;
            }
            Some(NamedParameter::FuelTokenAddress) => {
                self.fuel_token_address = parse_address(key, value)?;
            }
            Some(NamedParameter::FuelRate) => {
                self.fuel_rate = parse_uint(key, value)?;
            }
            None => {
                let key = key.trim();
                if key.is_empty() {
                    return Err(DeployError::ParameterBinding(
                        "empty parameter name".to_string(),
                    ));
                }

                self.extra.insert(key.to_string(), value.trim().to_string());
            }
        }

        Ok(())
    }

    pub fn with_overrides<'a>(
        mut self,
        overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, DeployError> {
        for (key, value) in overrides {
            self.set(key, value)?;
        }

        Ok(self)
    }

    pub fn addresses(&self) -> [Address; 3] {
        [
            self.admin_address,
            self.treasury_address,
            self.fuel_token_address,
        ]
    }

    pub fn arity(&self) -> usize {
        NamedParameter::iter().count() + self.extra.len()
    }

    pub fn entries(&self) -> Vec<(String, ParameterValue)> {
        let mut values: Vec<_> = NamedParameter::iter()
            .map(|param| {
                let value = match param {
                    NamedParameter::AdminAddress => {
                        ParameterValue::Address(self.admin_address)
                    }
                    NamedParameter::TreasuryAddress => {
                        ParameterValue::Address(self.treasury_address)
                    }
                    NamedParameter::FuelTokenAddress => {
                        ParameterValue::Address(self.fuel_token_address)
                    }
                    NamedParameter::FuelRate => {
                        ParameterValue::Uint(self.fuel_rate)
                    }
                };

                (param.to_string(), value)
            })
            .collect();

        values.extend(
            self.extra
                .iter()
                .map(|(k, v)| (k.clone(), ParameterValue::Raw(v.clone()))),
        );

        values
    }

    /// Orders the parameters as the artifact's constructor declares them.
    ///
    /// Arity, names and types all have to line up, nothing is matched by
    /// position alone.
    pub fn bind(
        &self,
        constructor: Option<&Constructor>,
    ) -> Result<Vec<Token>, DeployError> {
        let inputs = constructor.map(|c| c.inputs.as_slice()).unwrap_or(&[]);

        if inputs.len() != self.arity() {
            return Err(DeployError::ParameterBinding(format!(
                "constructor declares {} inputs but {} parameters were supplied",
                inputs.len(),
                self.arity()
            )));
        }

        let mut remaining = self.entries();
        let mut tokens = Vec::with_capacity(inputs.len());

        for (position, input) in inputs.iter().enumerate() {
            let index = remaining
                .iter()
                .position(|(name, _)| names_match(name, &input.name))
                .ok_or_else(|| {
                    DeployError::ParameterBinding(format!(
                        "no parameter supplied for constructor input #{position} `{}` ({})",
                        input.name, input.kind
                    ))
                })?;

            let (name, value) = remaining.remove(index);

            tokens.push(to_token(&name, value, &input.kind)?);
        }

        Ok(tokens)
    }
}

fn names_match(supplied: &str, declared: &str) -> bool {
    match NamedParameter::lookup(supplied) {
        Some(param) => param.matches(declared),
        None => normalize(supplied) == normalize(declared),
    }
}

fn to_token(
    name: &str,
    value: ParameterValue,
    kind: &ParamType,
) -> Result<Token, DeployError> {
    let mismatch = |value: &ParameterValue| {
        DeployError::ParameterBinding(format!(
            "`{name}` = {value} does not fit constructor type {kind}"
        ))
    };

    // Signed inputs take non-negative values only, so the sign bit stays clear
    let fits = |value: U256| match kind {
        ParamType::Uint(bits) => value.bits() <= *bits,
        ParamType::Int(bits) => value.bits() < *bits,
        _ => false,
    };

    match (kind, value) {
        (ParamType::Address, ParameterValue::Address(address)) => {
            Ok(Token::Address(address))
        }
        (ParamType::Address, ParameterValue::Raw(raw)) => {
            Ok(Token::Address(parse_address(name, &raw)?))
        }
        (ParamType::Uint(_), ParameterValue::Uint(value)) if fits(value) => {
            Ok(Token::Uint(value))
        }
        (ParamType::Uint(_) | ParamType::Int(_), ParameterValue::Raw(raw)) => {
            let value = parse_uint(name, &raw)?;
            if !fits(value) {
                return Err(mismatch(&ParameterValue::Uint(value)));
            }

            Ok(match kind {
                ParamType::Int(_) => Token::Int(value),
                _ => Token::Uint(value),
            })
        }
        (ParamType::Bool, ParameterValue::Raw(raw)) => {
            match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Token::Bool(true)),
                "false" => Ok(Token::Bool(false)),
                _ => Err(mismatch(&ParameterValue::Raw(raw))),
            }
        }
        (ParamType::String, ParameterValue::Raw(raw)) => Ok(Token::String(raw)),
        (_, value) => Err(mismatch(&value)),
    }
}

/// Parses a `key=value` pair as given on the command line.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{s}`"))?;

    if key.trim().is_empty() {
        return Err(format!("missing key in `{s}`"));
    }

    Ok((key.trim().to_string(), value.trim().to_string()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterOverrides(pub BTreeMap<String, String>);

impl ParameterOverrides {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
