use crate::apps::types::AppError;

pub enum Instruction {
    SaveCf { key: String, value: Vec<u8> },
    GetCf { key: String },
    MultiGetCf { keys: Vec<String> },
    RemoveCf { key: String },
}

#[derive(Debug)]
pub enum OutputOpts {
    SingleByte {
        value: Option<Vec<u8>>,
    },
    MultiBytes {
        values: Vec<Result<Option<Vec<u8>>, AppError>>,
    },
    None,
}

impl OutputOpts {
    /// the single value of a `GetCf` read, any other output reads as missing
    pub fn single(self) -> Option<Vec<u8>> {
        match self {
            OutputOpts::SingleByte { value } => value,
            _ => None,
        }
    }

    /// the values of a `MultiGetCf` read, missing keys are skipped
    pub fn multi(self) -> Result<Vec<Vec<u8>>, AppError> {
        match self {
            OutputOpts::MultiBytes { values } => values
                .into_iter()
                .filter_map(|value| value.transpose())
                .collect(),
            _ => Ok(Vec::new()),
        }
    }
}
