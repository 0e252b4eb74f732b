//! JSON stages.

use std::io::{Read, Write};
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::http::body::{BodyError, BoxError, Validate};
use crate::pipeline::{Parser, Presenter};

/// Reads the whole input as JSON and validates it.
#[derive(Debug)]
pub struct JsonParser<T>(PhantomData<fn() -> T>);

impl<T> JsonParser<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Parser<T> for JsonParser<T>
where
    T: DeserializeOwned + Validate,
{
    fn parse(&self, reader: &mut (dyn Read + Send)) -> Result<T, BoxError> {
        let value: T = serde_json::from_reader(reader).map_err(BodyError::Decode)?;
        value.validate().map_err(BodyError::Validate)?;
        Ok(value)
    }
}

/// Writes the output as one JSON document.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPresenter;

impl<O> Presenter<O> for JsonPresenter
where
    O: Serialize,
{
    fn present(&self, writer: &mut (dyn Write + Send), output: O) -> Result<(), BoxError> {
        serde_json::to_writer(writer, &output).map_err(BodyError::Encode)?;
        Ok(())
    }
}
