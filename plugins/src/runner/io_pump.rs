use anyhow::Context;
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;

use wsrun_core::util::RingBytes;

/// Keep the tail of a child stream in `ring`.
pub fn pump_capture<R>(
    mut rd: R,
    ring: RingBytes,
    label: &'static str,
) -> JoinHandle<anyhow::Result<u64>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0u64;

        loop {
            let n = rd
                .read(&mut buf)
                .await
                .with_context(|| format!("failed to read child {label}"))?;
            if n == 0 {
                break;
            }
            ring.push(&buf[..n]);
            total += n as u64;
        }

        Ok(total)
    })
}

/// Forward a child stream line by line, each line prefixed with `prefix`.
///
/// `emit` receives one complete, newline-terminated line per call, so
/// concurrent pumps sharing an output never interleave inside a line.
pub fn pump_prefixed<R, F>(
    mut rd: R,
    prefix: String,
    label: &'static str,
    mut emit: F,
) -> JoinHandle<anyhow::Result<u64>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    F: FnMut(&[u8]) -> std::io::Result<()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0u64;
        let mut line_buf: Vec<u8> = Vec::with_capacity(8 * 1024);

        loop {
            let n = rd
                .read(&mut buf)
                .await
                .with_context(|| format!("failed to read child {label}"))?;
            if n == 0 {
                break;
            }
            total += n as u64;

            line_buf.extend_from_slice(&buf[..n]);
            while let Some(pos) = line_buf.iter().position(|&b| b == b'\n') {
                let mut one = line_buf.drain(..=pos).collect::<Vec<u8>>();
                trim_newline(&mut one);
                emit(&prefixed_line(&prefix, &one))
                    .with_context(|| format!("failed to forward child {label}"))?;
            }
        }

        // EOF flush: deliver the last partial line if it doesn't end with '\n'.
        trim_newline(&mut line_buf);
        if !line_buf.is_empty() {
            emit(&prefixed_line(&prefix, &line_buf))
                .with_context(|| format!("failed to forward child {label}"))?;
        }

        Ok(total)
    })
}

fn prefixed_line(prefix: &str, line: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + line.len() + 3);
    out.extend_from_slice(prefix.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(line);
    out.push(b'\n');
    out
}

fn trim_newline(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn prefixes_every_line_and_flushes_the_last_one() {
        let (mut wr, rd) = tokio::io::duplex(1024);
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = lines.clone();

        let task = pump_prefixed(rd, "pkg-a".to_string(), "stdout", move |line| {
            sink.lock()
                .unwrap()
                .push(String::from_utf8_lossy(line).into_owned());
            Ok(())
        });

        wr.write_all(b"first\r\nsec").await.unwrap();
        wr.write_all(b"ond\nlast").await.unwrap();
        drop(wr);

        assert_eq!(task.await.unwrap().unwrap(), 18);
        assert_eq!(
            *lines.lock().unwrap(),
            vec!["pkg-a: first\n", "pkg-a: second\n", "pkg-a: last\n"]
        );
    }

    #[tokio::test]
    async fn capture_keeps_the_tail() {
        let (mut wr, rd) = tokio::io::duplex(1024);
        let ring = RingBytes::new(6);

        let task = pump_capture(rd, ring.clone(), "stderr");
        wr.write_all(b"abc\ndef\n").await.unwrap();
        drop(wr);

        assert_eq!(task.await.unwrap().unwrap(), 8);
        assert_eq!(ring.to_string_lossy(), "c\ndef\n");
    }
}
