use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A trading pair string is not of the form `BASE-QUOTE`.
    MalformedSymbol(String),

    /// A parsed asset is not part of the fixed vertex set.
    UnknownAsset(String),

    /// A tick carried a price for which `-ln(price)` is undefined.
    InvalidPrice { symbol: String, price: f64 },

    /// The engine was constructed without any asset, so there is no reference vertex.
    EmptyGraph,

    /// Indicates an attempt to access a node index that exceeds the graph size (N).
    NodeIndexOutOfBounds(usize),

    /// Failed to trace the full cycle path, usually due to broken predecessor chains.
    CycleReconstructionFailed,
}

impl Error {
    /// Whether the condition means the tick stream must stop.
    ///
    /// Fatal errors point at a configuration or pipeline defect. Everything else is a
    /// market-data condition: the caller logs it, drops the tick and continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::MalformedSymbol(_) | Error::EmptyGraph | Error::NodeIndexOutOfBounds(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MalformedSymbol(s) => {
                write!(f, "Malformed symbol '{}': expected BASE-QUOTE.", s)
            }

            Error::UnknownAsset(a) => write!(f, "Asset '{}' is not registered in the graph.", a),

            Error::InvalidPrice { symbol, price } => {
                write!(f, "Invalid price {} for symbol '{}'.", price, symbol)
            }

            Error::EmptyGraph => write!(f, "Graph has no assets."),

            Error::NodeIndexOutOfBounds(n) => write!(f, "Node index {} is out of bounds.", n),

            Error::CycleReconstructionFailed => write!(
                f,
                "Cycle path reconstruction failed due to broken predecessor chain."
            ),
        }
    }
}

impl std::error::Error for Error {}
