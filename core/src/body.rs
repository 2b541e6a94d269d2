//! Draining a response body of unknown length.

use bytes::{Bytes, BytesMut};
use log::trace;

use crate::engine::{Engine, RequestHandle};
use crate::error::{HttpError, ReadFailure};

/// Poll the engine for available bytes and read them until it reports zero.
///
/// Returns the whole body and its length. There is no iteration bound; the
/// loop ends when the engine says nothing is left. Any failure discards what
/// was read so far.
pub fn read_body<E: Engine + ?Sized>(
    engine: &E,
    request: RequestHandle,
) -> Result<(Bytes, u64), HttpError> {
    let mut body = BytesMut::new();
    let mut content_length: u64 = 0;

    let fail = |received: u64, reason: ReadFailure| HttpError::Read { received, reason };

    loop {
        let available = engine
            .query_data_available(request)
            .map_err(|e| fail(content_length, ReadFailure::QueryAvailable(e)))?;
        if available == 0 {
            break;
        }

        let mut chunk = vec![0u8; available];
        let n = engine
            .read_chunk(request, &mut chunk)
            .map_err(|e| fail(content_length, ReadFailure::Chunk(e)))?;
        if n != available {
            return Err(fail(
                content_length,
                ReadFailure::ShortRead {
                    expected: available,
                    actual: n,
                },
            ));
        }

        trace!("read {n} byte chunk");
        body.extend_from_slice(&chunk);
        content_length += n as u64;
    }

    Ok((body.freeze(), content_length))
}
