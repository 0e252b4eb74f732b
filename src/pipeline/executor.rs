//! Runs the three stages in order.

use std::fmt;
use std::io::{Read, Write};

use tokio_util::sync::CancellationToken;

use crate::http::body::BoxError;
use crate::pipeline::{Parser, Presenter, Processor};

/// A parser, processor and presenter run as one unit.
pub struct Executor<I, O> {
    parser: Box<dyn Parser<I>>,
    processor: Box<dyn Processor<I, O>>,
    presenter: Box<dyn Presenter<O>>,
}

impl<I, O> Executor<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new(
        parser: impl Parser<I> + 'static,
        processor: impl Processor<I, O> + 'static,
        presenter: impl Presenter<O> + 'static,
    ) -> Self {
        Self {
            parser: Box::new(parser),
            processor: Box::new(processor),
            presenter: Box::new(presenter),
        }
    }

    /// Parse `reader`, process the input, present the output to `writer`.
    pub async fn execute(
        &self,
        ctx: &CancellationToken,
        reader: &mut (dyn Read + Send),
        writer: &mut (dyn Write + Send),
    ) -> Result<(), BoxError> {
        let input = self.parser.parse(reader)?;
        let output = self.processor.process(ctx, input).await?;
        self.presenter.present(writer, output)
    }
}

impl<I, O> fmt::Debug for Executor<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor").finish_non_exhaustive()
    }
}
