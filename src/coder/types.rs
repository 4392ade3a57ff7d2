//! Codec for plain user-defined types (no discriminator)

use std::collections::HashMap;

use super::layout::{compile_type_def, Layout};
use crate::error::{Error, Result};
use crate::idl::Idl;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct TypesCoder {
    layouts: HashMap<String, Layout>,
}

impl TypesCoder {
    pub fn new(idl: &Idl) -> Result<Self> {
        let catalog = idl.catalog();
        let layouts = idl
            .types
            .iter()
            .map(|def| Ok((def.name.clone(), compile_type_def(def, &catalog)?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { layouts })
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Compiled layout of a named type
    pub fn layout(&self, name: &str) -> Result<&Layout> {
        self.layouts.get(name).ok_or_else(|| Error::UnknownName {
            kind: "type",
            name: name.to_string(),
        })
    }

    pub fn encode(&self, name: &str, value: &Value) -> Result<Vec<u8>> {
        self.layout(name)?.encode_to_vec(value)
    }

    pub fn decode(&self, name: &str, data: &[u8]) -> Result<Value> {
        self.layout(name)?.decode(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_type_has_no_prefix() {
        let idl = Idl::parse(
            r#"{"name": "p", "types": [
                {"name": "Point", "type": {"kind": "struct", "fields": [
                    {"name": "x", "type": "i32"}, {"name": "y", "type": "i32"}
                ]}}
            ]}"#,
        )
        .unwrap();
        let coder = TypesCoder::new(&idl).unwrap();
        let point = Value::structure([("x", Value::I32(-1)), ("y", Value::I32(2))]);
        let bytes = coder.encode("Point", &point).unwrap();
        assert_eq!(bytes, vec![0xff, 0xff, 0xff, 0xff, 2, 0, 0, 0]);
        assert_eq!(coder.decode("Point", &bytes).unwrap(), point);
        assert!(matches!(
            coder.decode("Line", &bytes),
            Err(Error::UnknownName { kind: "type", .. })
        ));
    }
}
