use std::{error::Error, fmt};

#[derive(Debug)]
pub enum TradeEngineError {
    Simple(String),
    Transport(String),
    StrumParsing(strum::ParseError),
    Secp(secp256k1::Error),
    SerdesJson(serde_json::Error),
    Io(std::io::Error),
    MpscSend(String),
    OneshotRecv(tokio::sync::oneshot::error::RecvError),
}

impl Error for TradeEngineError {}

impl fmt::Display for TradeEngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let error_string = match self {
            TradeEngineError::Simple(msg) => format!("TradeEngine-Error | Other - {}", msg),
            TradeEngineError::Transport(msg) => {
                format!("TradeEngine-Error | Transport - {}", msg)
            }
            TradeEngineError::StrumParsing(err) => {
                format!("TradeEngine-Error | StrumParseError - {}", err.to_string())
            }
            TradeEngineError::Secp(err) => {
                format!("TradeEngine-Error | SecpError - {}", err.to_string())
            }
            TradeEngineError::SerdesJson(err) => {
                format!("TradeEngine-Error | SerdesJsonError - {}", err.to_string())
            }
            TradeEngineError::Io(err) => {
                format!("TradeEngine-Error | IoError - {}", err.to_string())
            }
            TradeEngineError::MpscSend(msg) => {
                format!("TradeEngine-Error | MpscSendError - {}", msg)
            }
            TradeEngineError::OneshotRecv(err) => {
                format!("TradeEngine-Error | OneshotRecvError - {}", err.to_string())
            }
        };
        write!(f, "{}", error_string)
    }
}

impl From<strum::ParseError> for TradeEngineError {
    fn from(e: strum::ParseError) -> TradeEngineError {
        TradeEngineError::StrumParsing(e)
    }
}

impl From<secp256k1::Error> for TradeEngineError {
    fn from(e: secp256k1::Error) -> TradeEngineError {
        TradeEngineError::Secp(e)
    }
}

impl From<serde_json::Error> for TradeEngineError {
    fn from(e: serde_json::Error) -> TradeEngineError {
        TradeEngineError::SerdesJson(e)
    }
}

impl From<std::io::Error> for TradeEngineError {
    fn from(e: std::io::Error) -> TradeEngineError {
        TradeEngineError::Io(e)
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for TradeEngineError {
    fn from(e: tokio::sync::mpsc::error::SendError<T>) -> TradeEngineError {
        TradeEngineError::MpscSend(e.to_string())
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for TradeEngineError {
    fn from(e: tokio::sync::oneshot::error::RecvError) -> TradeEngineError {
        TradeEngineError::OneshotRecv(e)
    }
}
