//! Forward-only link scraping.
//!
//! The catalog pages are fed chunk by chunk into `html5ever`'s tokenizer and
//! inspected token by token. Scanning stops at the first match; the document
//! is never held in memory as a whole.

use std::fmt;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

/// What a scan is looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// `href` of an `<a>` whose immediately following text equals the label
    AnchorLabelled(String),
    /// `src` of the first `<iframe>`
    FirstIframe,
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkTarget::AnchorLabelled(label) => write!(f, "link labelled {:?}", label),
            LinkTarget::FirstIframe => write!(f, "download frame"),
        }
    }
}

#[derive(Debug)]
enum ScanState {
    SeekingMatch,
    /// Inside `<a href=..>`, collecting the text node that follows it
    PeekingText { href: String, text: String },
    Done(String),
}

struct LinkSink {
    target: LinkTarget,
    state: ScanState,
}

impl LinkSink {
    fn new(target: LinkTarget) -> Self {
        Self {
            target,
            state: ScanState::SeekingMatch,
        }
    }

    /// The text node following an anchor has ended; decide whether it matched.
    fn settle_text(&mut self) {
        if let ScanState::PeekingText { href, text } = &mut self.state {
            let matched = match &self.target {
                LinkTarget::AnchorLabelled(label) => text.trim() == label.as_str(),
                LinkTarget::FirstIframe => false,
            };
            self.state = if matched {
                ScanState::Done(std::mem::take(href))
            } else {
                ScanState::SeekingMatch
            };
        }
    }

    fn on_tag(&mut self, tag: Tag) -> TokenSinkResult<()> {
        self.settle_text();
        if matches!(self.state, ScanState::Done(_)) || tag.kind != TagKind::StartTag {
            return TokenSinkResult::Continue;
        }

        let name: &str = &tag.name;
        match (&self.target, name) {
            (LinkTarget::AnchorLabelled(_), "a") => {
                if let Some(href) = attribute(&tag, "href") {
                    self.state = ScanState::PeekingText {
                        href,
                        text: String::new(),
                    };
                }
            }
            (LinkTarget::FirstIframe, "iframe") => {
                if let Some(src) = attribute(&tag, "src") {
                    self.state = ScanState::Done(src);
                }
            }
            _ => {}
        }

        // Without a tree builder the tokenizer must be told about raw text
        // elements, or script bodies get tokenized as markup.
        match name {
            "script" => TokenSinkResult::RawData(RawKind::ScriptData),
            "style" | "xmp" | "iframe" | "noembed" | "noframes" => {
                TokenSinkResult::RawData(RawKind::Rawtext)
            }
            "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
            _ => TokenSinkResult::Continue,
        }
    }
}

fn attribute(tag: &Tag, name: &str) -> Option<String> {
    tag.attrs
        .iter()
        .find(|attr| &*attr.name.local == name)
        .map(|attr| attr.value.to_string())
}

impl TokenSink for LinkSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        if matches!(self.state, ScanState::Done(_)) {
            return TokenSinkResult::Continue;
        }

        match token {
            Token::TagToken(tag) => return self.on_tag(tag),
            Token::CharacterTokens(chars) => {
                if let ScanState::PeekingText { text, .. } = &mut self.state {
                    text.push_str(&chars);
                }
            }
            Token::ParseError(_) => {}
            _ => self.settle_text(),
        }
        TokenSinkResult::Continue
    }
}

/// Incremental scanner fed with raw response bytes.
pub struct LinkScanner {
    tokenizer: Tokenizer<LinkSink>,
    queue: BufferQueue,
    pending: Vec<u8>,
}

impl LinkScanner {
    pub fn new(target: LinkTarget) -> Self {
        Self {
            tokenizer: Tokenizer::new(LinkSink::new(target), TokenizerOpts::default()),
            queue: BufferQueue::new(),
            pending: Vec::new(),
        }
    }

    /// Feed the next chunk of the document. Returns the link as soon as it
    /// is found; callers should stop reading at that point.
    pub fn feed(&mut self, bytes: &[u8]) -> Option<String> {
        if self.found().is_some() {
            return self.found();
        }

        self.pending.extend_from_slice(bytes);
        let text = take_utf8_prefix(&mut self.pending);
        self.push(&text);
        self.found()
    }

    /// Signal end of document. `None` means the target never appeared.
    pub fn finish(mut self) -> Option<String> {
        if self.found().is_none() {
            let rest = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            self.push(&rest);
            self.tokenizer.end();
        }
        self.found()
    }

    fn push(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.queue.push_back(StrTendril::from_slice(text));
        let _ = self.tokenizer.feed(&mut self.queue);
    }

    fn found(&self) -> Option<String> {
        match &self.tokenizer.sink.state {
            ScanState::Done(link) => Some(link.clone()),
            _ => None,
        }
    }
}

/// Split off the longest decodable prefix, keeping an incomplete trailing
/// UTF-8 sequence for the next chunk.
fn take_utf8_prefix(pending: &mut Vec<u8>) -> String {
    // Invalid bytes are left for lossy decoding; only a truncated sequence
    // at the very end is carried over.
    let mut start = 0;
    let valid = loop {
        match std::str::from_utf8(&pending[start..]) {
            Ok(_) => break pending.len(),
            Err(e) => match e.error_len() {
                Some(len) => start += e.valid_up_to() + len,
                None => break start + e.valid_up_to(),
            },
        }
    };
    let rest = pending.split_off(valid);
    let text = String::from_utf8_lossy(pending).into_owned();
    *pending = rest;
    text
}

/// Scan a complete in-memory document.
pub fn scan_document(html: &str, target: LinkTarget) -> Option<String> {
    let mut scanner = LinkScanner::new(target);
    if let Some(link) = scanner.feed(html.as_bytes()) {
        return Some(link);
    }
    scanner.finish()
}
