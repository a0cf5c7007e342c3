use std::fmt::Display;

/// The closed set of organization-size ranges offered by the signup form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrganizationSize {
    UpToTen,
    ElevenToFifty,
    FiftyOneToOneHundred,
    OneHundredOneToOneThousand,
    OverOneThousand,
}

impl OrganizationSize {
    pub fn parse(value: &str) -> Result<OrganizationSize, String> {
        match value {
            "0-10" => Ok(Self::UpToTen),
            "11-50" => Ok(Self::ElevenToFifty),
            "51-100" => Ok(Self::FiftyOneToOneHundred),
            "101-1000" => Ok(Self::OneHundredOneToOneThousand),
            "1000+" => Ok(Self::OverOneThousand),
            other => Err(format!("{} is not a recognised organization size", other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpToTen => "0-10",
            Self::ElevenToFifty => "11-50",
            Self::FiftyOneToOneHundred => "51-100",
            Self::OneHundredOneToOneThousand => "101-1000",
            Self::OverOneThousand => "1000+",
        }
    }
}

impl Display for OrganizationSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
