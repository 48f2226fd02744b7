//! Prepared scripts.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use jsi_core::{Buffer, PreparedJavaScript};

/// A [`Buffer`] that owns its bytes.
#[derive(Debug, Clone, Default)]
pub struct VectorBuffer(Vec<u8>);

impl VectorBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Buffer for VectorBuffer {
    fn data(&self) -> &[u8] {
        &self.0
    }
}

/// Serialized script packaged with the source it was built from.
///
/// The engine needs the source again when running the serialized form, so
/// the caller's buffer is shared rather than copied.
pub struct NapiPreparedJavaScript {
    serialized: VectorBuffer,
    source: Rc<dyn Buffer>,
    source_url: String,
}

impl NapiPreparedJavaScript {
    pub fn new(serialized: VectorBuffer, source: Rc<dyn Buffer>, source_url: String) -> Self {
        Self {
            serialized,
            source,
            source_url,
        }
    }

    pub fn serialized_buffer(&self) -> &VectorBuffer {
        &self.serialized
    }

    pub fn source_buffer(&self) -> &Rc<dyn Buffer> {
        &self.source
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }
}

impl PreparedJavaScript for NapiPreparedJavaScript {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for NapiPreparedJavaScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NapiPreparedJavaScript")
            .field("serialized", &self.serialized.size())
            .field("source", &self.source.size())
            .field("source_url", &self.source_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsi_core::StringBuffer;

    #[test]
    fn test_prepared_script_parts() {
        let source: Rc<dyn Buffer> = Rc::new(StringBuffer::new("1 + 2"));
        let prepared = NapiPreparedJavaScript::new(
            VectorBuffer::new(vec![1, 2, 3]),
            source.clone(),
            "a.js".to_string(),
        );
        assert_eq!(prepared.serialized_buffer().data(), &[1, 2, 3]);
        assert!(Rc::ptr_eq(prepared.source_buffer(), &source));
        assert_eq!(prepared.source_url(), "a.js");
        assert!(prepared.as_any().is::<NapiPreparedJavaScript>());
        assert!(format!("{prepared:?}").contains("a.js"));
    }

    #[test]
    fn test_vector_buffer() {
        let buffer = VectorBuffer::new(b"abc".to_vec());
        assert_eq!(buffer.size(), 3);
        assert_eq!(buffer.into_inner(), b"abc");
    }
}
