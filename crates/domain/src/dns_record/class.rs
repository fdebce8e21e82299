use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DnsClass {
    IN,
    CS,
    CH,
    HS,
    NONE,
    ANY,
    Unknown(u16),
}

impl DnsClass {
    pub fn to_u16(&self) -> u16 {
        match self {
            DnsClass::IN => 1,
            DnsClass::CS => 2,
            DnsClass::CH => 3,
            DnsClass::HS => 4,
            DnsClass::NONE => 254,
            DnsClass::ANY => 255,
            DnsClass::Unknown(code) => *code,
        }
    }

    pub fn from_u16(code: u16) -> Self {
        match code {
            1 => DnsClass::IN,
            2 => DnsClass::CS,
            3 => DnsClass::CH,
            4 => DnsClass::HS,
            254 => DnsClass::NONE,
            255 => DnsClass::ANY,
            other => DnsClass::Unknown(other),
        }
    }
}

impl Default for DnsClass {
    fn default() -> Self {
        DnsClass::IN
    }
}

impl fmt::Display for DnsClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DnsClass::IN => f.write_str("IN"),
            DnsClass::CS => f.write_str("CS"),
            DnsClass::CH => f.write_str("CH"),
            DnsClass::HS => f.write_str("HS"),
            DnsClass::NONE => f.write_str("NONE"),
            DnsClass::ANY => f.write_str("ANY"),
            DnsClass::Unknown(code) => write!(f, "CLASS{}", code),
        }
    }
}

impl FromStr for DnsClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        if let Some(code) = upper.strip_prefix("CLASS") {
            return code
                .parse::<u16>()
                .map(DnsClass::from_u16)
                .map_err(|_| format!("Unknown class: {}", s));
        }
        match upper.as_str() {
            "IN" => Ok(DnsClass::IN),
            "CS" => Ok(DnsClass::CS),
            "CH" => Ok(DnsClass::CH),
            "HS" => Ok(DnsClass::HS),
            "NONE" => Ok(DnsClass::NONE),
            "ANY" | "*" => Ok(DnsClass::ANY),
            _ => Err(format!("Unknown class: {}", s)),
        }
    }
}
