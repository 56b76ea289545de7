use serde::{Deserialize, Serialize};

/// Primitive value kinds carried by constants and parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Uuid,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Int => write!(f, "int"),
            ValueKind::Float => write!(f, "float"),
            ValueKind::String => write!(f, "string"),
            ValueKind::Uuid => write!(f, "uuid"),
        }
    }
}

/// The element type of a query or expression: a scalar or a row shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrType {
    Value(ValueKind),
    Product(ProductType),
}

impl IrType {
    pub fn is_bool(&self) -> bool {
        matches!(self, IrType::Value(ValueKind::Bool))
    }

    pub fn as_product(&self) -> Option<&ProductType> {
        match self {
            IrType::Product(p) => Some(p),
            IrType::Value(_) => None,
        }
    }
}

impl std::fmt::Display for IrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrType::Value(kind) => write!(f, "{}", kind),
            IrType::Product(p) => write!(f, "{}", p),
        }
    }
}

impl From<ValueKind> for IrType {
    fn from(kind: ValueKind) -> Self {
        IrType::Value(kind)
    }
}

impl From<ProductType> for IrType {
    fn from(p: ProductType) -> Self {
        IrType::Product(p)
    }
}

/// A named row shape. Field order is significant and preserved everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductType {
    pub name: String,
    pub fields: Vec<(String, IrType)>,
}

impl ProductType {
    pub fn new(name: impl Into<String>, fields: Vec<(String, IrType)>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Look up a field's type by name.
    pub fn field(&self, name: &str) -> Option<&IrType> {
        self.fields
            .iter()
            .find(|(f, _)| f == name)
            .map(|(_, ty)| ty)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(f, _)| f.as_str())
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, (name, ty)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, ty)?;
        }
        write!(f, ")")
    }
}
