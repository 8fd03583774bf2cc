use colloquy_session::{ConversationMode, Session};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub const PROMPT: &str = "Query: ";

/// Read questions line by line until `quit` or end of input.
///
/// A failed turn is reported on `output` and the loop keeps going; only I/O
/// errors on the terminal itself end it early. Returns the number of turns
/// that produced a reply.
pub async fn run<M, R, W>(
    session: &mut Session<M>,
    input: R,
    output: &mut W,
    quit: &str,
) -> anyhow::Result<usize>
where
    M: ConversationMode,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut answered = 0;

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question == quit {
            break;
        }
        if question.is_empty() {
            continue;
        }

        match session.ask(question).await {
            Ok(reply) => {
                answered += 1;
                output.write_all(format!("{}\n", reply).as_bytes()).await?;
            }
            Err(e) => {
                tracing::warn!(kind = e.kind(), "Turn failed: {}", e);
                output
                    .write_all(format!("error [{}]: {}\n", e.kind(), e).as_bytes())
                    .await?;
            }
        }
    }

    output.flush().await?;
    Ok(answered)
}
