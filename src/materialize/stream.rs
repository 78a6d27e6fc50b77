//! Forward-only materialization streams.
//!
//! Every stream follows the same lifecycle: it starts before the first row,
//! becomes active on the first successful advance, and goes exhausted when
//! the cursor runs out, a row fails to materialize, or the consumer disposes
//! it early. Exhaustion is
//! terminal; further iteration yields nothing and rewinding is refused.
//! A completion hook attached to a stream fires exactly once, whether the
//! stream ends by natural exhaustion, an explicit [`EntityStream::dispose`],
//! or being dropped mid-iteration.
//!
//! # Key Components
//!
//! - [`EntityStream`]: one entity per row through a pre-built population plan
//! - [`ScalarStream`]: first-column scalars with lazy converter resolution
//! - [`HandlerStream`] / [`RowHandler`]: caller-controlled row decoding,
//!   bypassing the metadata cache entirely
//! - [`NullPolicy`]: what a null cell becomes in scalar and entity results

use std::{marker::PhantomData, sync::Arc};

use crate::{
    convert::{CellValue, ConversionMatrix, ConvertFn},
    materialize::{plan::PopulationPlan, RowCursor},
    metadata::Reflected,
    Result,
};

/// What a database null materializes as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullPolicy {
    /// Yield the target type's default value in place of the null
    #[default]
    IncludeAsDefault,
    /// Skip the null entirely; the result has fewer items than the source
    Omit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    NotStarted,
    Active,
    Exhausted,
}

type CompletionHook = Box<dyn FnOnce() + Send>;

fn fire(hook: &mut Option<CompletionHook>) {
    if let Some(hook) = hook.take() {
        hook();
    }
}

/// Streams one materialized entity per cursor row.
///
/// Built by [`crate::materialize::Materializer::stream`]; the population plan
/// is computed before the first row, so per-row work is construction plus a
/// walk over pre-bound column slots.
pub struct EntityStream<'c, T: Reflected> {
    cursor: &'c mut dyn RowCursor,
    plan: PopulationPlan,
    buffer: Vec<CellValue>,
    state: StreamState,
    on_complete: Option<CompletionHook>,
    _entity: PhantomData<fn() -> T>,
}

impl<'c, T: Reflected> EntityStream<'c, T> {
    pub(crate) fn new(cursor: &'c mut dyn RowCursor, plan: PopulationPlan) -> Self {
        let width = cursor.field_count();
        EntityStream {
            cursor,
            plan,
            buffer: vec![CellValue::Null; width],
            state: StreamState::NotStarted,
            on_complete: None,
            _entity: PhantomData,
        }
    }

    /// Attach the completion hook; it fires exactly once.
    #[must_use]
    pub fn on_complete(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    /// End the stream early. Idempotent; fires the completion hook on the
    /// first call only.
    pub fn dispose(&mut self) {
        self.state = StreamState::Exhausted;
        fire(&mut self.on_complete);
    }

    /// Rewinding a forward-only stream is refused.
    ///
    /// # Errors
    /// Always returns [`crate::Error::ResetUnsupported`].
    pub fn reset(&mut self) -> Result<()> {
        Err(crate::Error::ResetUnsupported)
    }
}

impl<T: Reflected> Iterator for EntityStream<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == StreamState::Exhausted {
            return None;
        }
        match self.cursor.advance() {
            Ok(true) => {
                self.state = StreamState::Active;
                if let Err(error) = self.cursor.values(&mut self.buffer) {
                    self.dispose();
                    return Some(Err(error));
                }
                // A row that fails to materialize aborts the enumeration,
                // never just the row
                match self.plan.materialize(&self.buffer) {
                    Ok(instance) => match instance.downcast::<T>() {
                        Ok(entity) => Some(Ok(*entity)),
                        Err(_) => {
                            self.dispose();
                            Some(Err(crate::Error::Error(
                                "materialized instance is not the requested entity type"
                                    .to_string(),
                            )))
                        }
                    },
                    Err(error) => {
                        self.dispose();
                        Some(Err(error))
                    }
                }
            }
            Ok(false) => {
                self.dispose();
                None
            }
            Err(error) => {
                self.dispose();
                Some(Err(error))
            }
        }
    }
}

impl<T: Reflected> Drop for EntityStream<'_, T> {
    fn drop(&mut self) {
        fire(&mut self.on_complete);
    }
}

/// Streams the first column of each row as a typed scalar.
///
/// The converter is resolved lazily from the first non-null value's runtime
/// kind, so a declared column kind that disagrees with the actual payload
/// still converts correctly.
pub struct ScalarStream<'c, T: Reflected + Default> {
    cursor: &'c mut dyn RowCursor,
    matrix: Arc<ConversionMatrix>,
    converter: Option<ConvertFn>,
    policy: NullPolicy,
    state: StreamState,
    on_complete: Option<CompletionHook>,
    _scalar: PhantomData<fn() -> T>,
}

impl<'c, T: Reflected + Default> ScalarStream<'c, T> {
    pub(crate) fn new(
        cursor: &'c mut dyn RowCursor,
        matrix: Arc<ConversionMatrix>,
        policy: NullPolicy,
    ) -> Self {
        ScalarStream {
            cursor,
            matrix,
            converter: None,
            policy,
            state: StreamState::NotStarted,
            on_complete: None,
            _scalar: PhantomData,
        }
    }

    /// Attach the completion hook; it fires exactly once.
    #[must_use]
    pub fn on_complete(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    /// End the stream early. Idempotent; fires the completion hook on the
    /// first call only.
    pub fn dispose(&mut self) {
        self.state = StreamState::Exhausted;
        fire(&mut self.on_complete);
    }

    /// Rewinding a forward-only stream is refused.
    ///
    /// # Errors
    /// Always returns [`crate::Error::ResetUnsupported`].
    pub fn reset(&mut self) -> Result<()> {
        Err(crate::Error::ResetUnsupported)
    }

    fn convert(&mut self, cell: CellValue) -> Result<T> {
        let converter = match &self.converter {
            Some(converter) => converter.clone(),
            None => {
                let converter = self.matrix.converter(cell.kind(), T::cell_kind());
                self.converter = Some(converter.clone());
                converter
            }
        };
        T::from_value(converter(cell)?)
    }
}

impl<T: Reflected + Default> Iterator for ScalarStream<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.state == StreamState::Exhausted {
                return None;
            }
            match self.cursor.advance() {
                Ok(true) => {
                    self.state = StreamState::Active;
                    let cell = match self.cursor.value(0) {
                        Ok(cell) => cell,
                        Err(error) => return Some(Err(error)),
                    };
                    if cell.is_null() {
                        match self.policy {
                            NullPolicy::Omit => continue,
                            NullPolicy::IncludeAsDefault => return Some(Ok(T::default())),
                        }
                    }
                    return Some(self.convert(cell));
                }
                Ok(false) => {
                    self.dispose();
                    return None;
                }
                Err(error) => {
                    self.dispose();
                    return Some(Err(error));
                }
            }
        }
    }
}

impl<T: Reflected + Default> Drop for ScalarStream<'_, T> {
    fn drop(&mut self) {
        fire(&mut self.on_complete);
    }
}

/// Caller-controlled row decoding for shapes the cache cannot express.
///
/// The handler sees the raw cursor: [`RowHandler::begin`] once before the
/// first row, [`RowHandler::read_row`] positioned on each row, and
/// [`RowHandler::finish`] exactly once at the end of the stream.
pub trait RowHandler {
    /// The per-row output this handler produces.
    type Output;

    /// Called once before the first row, with the schema available.
    ///
    /// # Errors
    /// A failure here poisons the whole stream.
    fn begin(&mut self, _cursor: &dyn RowCursor) -> Result<()> {
        Ok(())
    }

    /// Decode the current row.
    ///
    /// # Errors
    /// Row-level failures surface as `Err` items; iteration continues.
    fn read_row(&mut self, cursor: &dyn RowCursor) -> Result<Self::Output>;

    /// Called exactly once when the stream ends, by exhaustion or disposal.
    fn finish(&mut self) {}
}

/// Streams handler outputs; the metadata cache is never consulted.
pub struct HandlerStream<'c, H: RowHandler> {
    cursor: &'c mut dyn RowCursor,
    // Present until `into_inner` takes it; `Option` keeps the `Drop` impl
    // from fighting the move
    handler: Option<H>,
    state: StreamState,
    finished: bool,
}

impl<'c, H: RowHandler> HandlerStream<'c, H> {
    pub(crate) fn new(cursor: &'c mut dyn RowCursor, handler: H) -> Self {
        HandlerStream {
            cursor,
            handler: Some(handler),
            state: StreamState::NotStarted,
            finished: false,
        }
    }

    /// End the stream early; the handler's `finish` runs on the first call
    /// only.
    pub fn dispose(&mut self) {
        self.state = StreamState::Exhausted;
        if !self.finished {
            self.finished = true;
            if let Some(handler) = self.handler.as_mut() {
                handler.finish();
            }
        }
    }

    /// Recover the handler, ending the stream if still active.
    #[must_use]
    pub fn into_inner(mut self) -> H {
        self.dispose();
        self.handler.take().expect("handler is present until consumed")
    }
}

impl<H: RowHandler> Iterator for HandlerStream<'_, H> {
    type Item = Result<H::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == StreamState::Exhausted {
            return None;
        }
        if self.state == StreamState::NotStarted {
            let begun = match self.handler.as_mut() {
                Some(handler) => handler.begin(&*self.cursor),
                None => return None,
            };
            if let Err(error) = begun {
                self.dispose();
                return Some(Err(error));
            }
        }
        match self.cursor.advance() {
            Ok(true) => {
                self.state = StreamState::Active;
                self.handler
                    .as_mut()
                    .map(|handler| handler.read_row(&*self.cursor))
            }
            Ok(false) => {
                self.dispose();
                None
            }
            Err(error) => {
                self.dispose();
                Some(Err(error))
            }
        }
    }
}

impl<H: RowHandler> Drop for HandlerStream<'_, H> {
    fn drop(&mut self) {
        if !self.finished {
            self.finished = true;
            if let Some(handler) = self.handler.as_mut() {
                handler.finish();
            }
        }
    }
}
