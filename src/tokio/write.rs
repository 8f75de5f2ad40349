//! Types which operate over [`AsyncWrite`](tokio::io::AsyncWrite) streams.
//!
//! Written data is copied into the stream as its input, so `poll_write` accepts the whole buffer
//! as soon as the previous input has been drained into the wrapped writer.

use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use futures_core::ready;
use pin_project_lite::pin_project;
use tokio::io::AsyncWrite;

use crate::{
    fallback::BUFFER_SIZE,
    write::{after_end, truncated, Compressing, Decompressing, Drive},
    Compressor, Decompressor, Result, ZlibProvider,
};

pin_project! {
    #[derive(Debug)]
    struct Writer<W, S> {
        #[pin]
        writer: W,
        stream: S,
        block: Box<[u8]>,
        // Bytes of `block` not yet accepted by `writer`.
        pos: usize,
        len: usize,
        ended: bool,
    }
}

impl<W: AsyncWrite, S: Drive> Writer<W, S> {
    fn new(writer: W, stream: S) -> Self {
        Self {
            writer,
            stream,
            block: vec![0; BUFFER_SIZE].into_boxed_slice(),
            pos: 0,
            len: 0,
            ended: false,
        }
    }

    fn poll_write_block(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let mut this = self.project();
        while *this.pos < *this.len {
            let written = ready!(this
                .writer
                .as_mut()
                .poll_write(cx, &this.block[*this.pos..*this.len]))?;
            if written == 0 {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write compressed data",
                )));
            }
            *this.pos += written;
        }
        *this.pos = 0;
        *this.len = 0;
        Poll::Ready(Ok(()))
    }

    /// Drain the stream into the writer until it needs input or is finished.
    fn poll_pump(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        loop {
            ready!(self.as_mut().poll_write_block(cx))?;
            let this = self.as_mut().project();
            if this.stream.trailing_input() {
                return Poll::Ready(Err(after_end()));
            }
            if this.stream.needs_input() || this.stream.finished() {
                return Poll::Ready(Ok(()));
            }
            let mut out = &mut this.block[..];
            *this.len = this.stream.drive(&mut out)?;
        }
    }

    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }
        if self.ended || self.stream.finished() {
            return Poll::Ready(Err(after_end()));
        }
        ready!(self.as_mut().poll_pump(cx))?;
        let this = self.project();
        if this.stream.finished() {
            return Poll::Ready(Err(after_end()));
        }
        this.stream
            .set_input(Box::new(Bytes::copy_from_slice(buf)))?;
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        ready!(self.as_mut().poll_pump(cx))?;
        self.project().writer.poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        {
            let this = self.as_mut().project();
            if !*this.ended {
                *this.ended = true;
                this.stream.end_input();
            }
        }
        loop {
            ready!(self.as_mut().poll_pump(cx))?;
            let this = self.as_mut().project();
            if this.stream.finished() {
                this.stream.close();
                break;
            }
            if this.stream.needs_input() {
                return Poll::Ready(Err(truncated()));
            }
        }
        self.project().writer.poll_shutdown(cx)
    }
}

macro_rules! writer {
    ($(#[$attr:meta])* $name:ident<$param:ident: $bound:ident>, $wrapper:ident, $with:ident, $create:ident) => {
        pin_project! {
            $(#[$attr])*
            #[derive(Debug)]
            pub struct $name<W, $param> {
                #[pin]
                inner: Writer<W, $wrapper<$param>>,
            }
        }

        impl<W: AsyncWrite> $name<W, Box<dyn $bound + Send>> {
            /// Wrap `writer` with a new stream from `provider`.
            pub fn new(writer: W, provider: &dyn ZlibProvider) -> Result<Self> {
                Ok(Self::$with(writer, provider.$create()?))
            }
        }

        impl<W: AsyncWrite, $param: $bound> $name<W, $param> {
            /// Wrap `writer` with the given stream, which must be fresh or reset.
            pub fn $with(writer: W, stream: $param) -> Self {
                Self {
                    inner: Writer::new(writer, $wrapper(stream)),
                }
            }

            /// Acquires a reference to the underlying writer.
            pub fn get_ref(&self) -> &W {
                &self.inner.writer
            }

            /// Acquires a mutable reference to the underlying writer.
            pub fn get_mut(&mut self) -> &mut W {
                &mut self.inner.writer
            }

            /// Acquires a pinned mutable reference to the underlying writer.
            pub fn get_pin_mut(self: Pin<&mut Self>) -> Pin<&mut W> {
                self.project().inner.project().writer
            }

            /// Consumes this adaptor returning the underlying writer.
            ///
            /// Output not yet written is lost unless the adaptor was shut down first.
            pub fn into_inner(self) -> W {
                self.inner.writer
            }
        }

        impl<W: AsyncWrite, $param: $bound> AsyncWrite for $name<W, $param> {
            fn poll_write(
                self: Pin<&mut Self>,
                cx: &mut Context<'_>,
                buf: &[u8],
            ) -> Poll<io::Result<usize>> {
                self.project().inner.poll_write(cx, buf)
            }

            fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
                self.project().inner.poll_flush(cx)
            }

            fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
                self.project().inner.poll_shutdown(cx)
            }
        }
    };
}

writer!(
    /// Compresses everything written to it into the wrapped [`AsyncWrite`].
    ///
    /// Shutting it down ends the stream, writes the remaining output and shuts the writer down.
    CompressWriter<C: Compressor>,
    Compressing,
    with_compressor,
    create_compressor
);

writer!(
    /// Decompresses everything written to it into the wrapped [`AsyncWrite`].
    ///
    /// Shutting it down fails with [`io::ErrorKind::UnexpectedEof`] if the compressed data was
    /// cut short.
    DecompressWriter<D: Decompressor>,
    Decompressing,
    with_decompressor,
    create_decompressor
);
