//! Conservative SVG minification.
//!
//! Only drops what never renders: comments, `<metadata>` subtrees and
//! whitespace-only text between tags outside `<text>`. Everything else is
//! written back as parsed.

use anyhow::{Result, bail};
use quick_xml::{Reader, Writer, events::Event};

pub fn optimize_svg(content: &[u8]) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(content);
    let mut writer = Writer::new(Vec::with_capacity(content.len()));

    let mut seen_root = false;
    // nesting depth inside a dropped <metadata> element
    let mut skipping = 0usize;
    // whitespace between <tspan>s is significant
    let mut in_text = 0usize;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => bail!("SVG parse error at position {}: {}", reader.error_position(), e),
        };

        match event {
            Event::Eof => break,
            Event::Start(elem) => {
                if !seen_root {
                    ensure_svg_root(elem.local_name().as_ref())?;
                    seen_root = true;
                }
                if skipping > 0 || elem.local_name().as_ref() == b"metadata" {
                    skipping += 1;
                    continue;
                }
                if elem.local_name().as_ref() == b"text" {
                    in_text += 1;
                }
                writer.write_event(Event::Start(elem))?;
            }
            Event::Empty(elem) => {
                if !seen_root {
                    ensure_svg_root(elem.local_name().as_ref())?;
                    seen_root = true;
                }
                if skipping > 0 || elem.local_name().as_ref() == b"metadata" {
                    continue;
                }
                writer.write_event(Event::Empty(elem))?;
            }
            Event::End(elem) => {
                if skipping > 0 {
                    skipping -= 1;
                    continue;
                }
                if elem.local_name().as_ref() == b"text" {
                    in_text = in_text.saturating_sub(1);
                }
                writer.write_event(Event::End(elem))?;
            }
            Event::Comment(_) => {}
            Event::Text(text) if in_text == 0 && text.iter().all(u8::is_ascii_whitespace) => {}
            _ if skipping > 0 => {}
            other => writer.write_event(other)?,
        }
    }

    if !seen_root {
        bail!("not an SVG document: no root element");
    }
    Ok(writer.into_inner())
}

fn ensure_svg_root(name: &[u8]) -> Result<()> {
    if name != b"svg" {
        bail!(
            "not an SVG document: root element is <{}>",
            String::from_utf8_lossy(name)
        );
    }
    Ok(())
}
