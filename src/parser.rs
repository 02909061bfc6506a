use crate::config::{ChannelSpec, CombineMode, Length, Sweep, SweepLaw, SynthConfig, SynthType};
use crate::error::ParseError;
use crate::token::{token_to_string, Span, Spanned, Token};

/// Builds a [`SynthConfig`] from the words of a synth argument line:
///
/// ```text
/// [-n] [length [off [ph [p1 [p2 [p3]]]]]]
///     {type [combine] [freq[k][:|+|/|-freq2[k]] [off [ph [p1 [p2 [p3]]]]]]}
/// ```
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Parser { tokens, pos: 0 }
    }

    // ── Helpers ──────────────────────────────────────────────

    fn current(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> Token {
        self.current().token.clone()
    }

    fn span(&self) -> Span {
        self.current().span
    }

    fn advance(&mut self) -> Spanned {
        let s = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        s
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::EOF)
    }

    // ── Argument line ───────────────────────────────────────

    pub fn parse_config(&mut self) -> Result<SynthConfig, ParseError> {
        let mut config = SynthConfig::default();
        self.parse_options(&mut config)?;
        config.length = self.parse_length()?;

        // Leading parameters become defaults for every channel.
        let mut master = ChannelSpec::default();
        self.parse_params(&mut master)?;

        let has_length = config.length.is_some();
        while !self.is_at_end() {
            let channel = self.parse_channel(&master, has_length)?;
            config.channels.push(channel);
        }
        if config.channels.is_empty() {
            config.channels.push(master);
        }
        Ok(config)
    }

    fn parse_options(&mut self, config: &mut SynthConfig) -> Result<(), ParseError> {
        while let Token::Flag(flag) = self.peek() {
            match flag.as_str() {
                "n" => config.no_headroom = true,
                _ => {
                    return Err(ParseError::UnknownOption {
                        text: self.current().text.clone(),
                        span: self.span(),
                    });
                }
            }
            self.advance();
        }
        Ok(())
    }

    fn parse_length(&mut self) -> Result<Option<Length>, ParseError> {
        let word = self.current();
        if !word.text.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            return Ok(None);
        }
        let length = parse_length_text(&word.text).ok_or_else(|| ParseError::InvalidLength {
            text: word.text.clone(),
            span: word.span,
        })?;
        self.advance();
        Ok(Some(length))
    }

    // ── Channel ─────────────────────────────────────────────

    fn parse_channel(
        &mut self,
        master: &ChannelSpec,
        has_length: bool,
    ) -> Result<ChannelSpec, ParseError> {
        let word = self.advance();
        let synth_type = match &word.token {
            Token::Word(name) => SynthType::from_name(name),
            _ => None,
        }
        .ok_or_else(|| ParseError::NoTypeGiven {
            found: token_to_string(&word.token),
            span: word.span,
        })?;

        let mut spec = ChannelSpec {
            synth_type,
            ..master.clone()
        };

        if let Token::Word(name) = self.peek() {
            if let Some(combine) = CombineMode::from_name(&name) {
                spec.combine = combine;
                self.advance();
            }
        }

        if looks_like_frequency(self.current()) {
            let word = self.advance();
            let (freq, sweep) = parse_frequency_word(&word, has_length)?;
            spec.freq = freq;
            spec.sweep = sweep;
        }

        self.parse_params(&mut spec)?;
        Ok(spec)
    }

    /// Optional trailing `off ph p1 p2 p3`, each a percentage.
    fn parse_params(&mut self, spec: &mut ChannelSpec) -> Result<(), ParseError> {
        let Some(offset) = self.numeric_param(-100.0, 100.0)? else {
            return Ok(());
        };
        spec.offset = offset;
        let Some(phase) = self.numeric_param(0.0, 100.0)? else {
            return Ok(());
        };
        spec.phase = phase;
        for slot in [&mut spec.p1, &mut spec.p2, &mut spec.p3] {
            let Some(p) = self.numeric_param(0.0, 100.0)? else {
                return Ok(());
            };
            *slot = Some(p);
        }
        Ok(())
    }

    /// A percentage in [min, max], returned as a fraction. Words that start
    /// like a number but carry anything else are rejected.
    fn numeric_param(&mut self, min: f64, max: f64) -> Result<Option<f64>, ParseError> {
        let word = self.current();
        let error = || ParseError::Parameter {
            text: word.text.clone(),
            min,
            max,
            span: word.span,
        };
        let value = match &word.token {
            Token::Number(n) => *n,
            Token::Word(text) if starts_numeric(text) => return Err(error()),
            _ => return Ok(None),
        };
        if !(min..=max).contains(&value) {
            return Err(error());
        }
        self.advance();
        Ok(Some(value / 100.0))
    }
}

// ── Word-level parsing ──────────────────────────────────────

fn starts_numeric(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() || c == '.' => true,
        Some('+' | '-') => chars.next().is_some_and(|c| c.is_ascii_digit() || c == '.'),
        _ => false,
    }
}

/// Anything after the type (and combine) that is neither another type nor
/// a leading `-` is taken as the frequency.
fn looks_like_frequency(word: &Spanned) -> bool {
    match &word.token {
        Token::EOF | Token::Flag(_) => false,
        _ => !word.text.starts_with('-') && SynthType::from_name(&word.text).is_none(),
    }
}

/// `NNNs` is a sample count; anything else is `[[hh:]mm:]ss[.frac]`.
pub fn parse_length_text(text: &str) -> Option<Length> {
    if let Some(count) = text.strip_suffix('s') {
        if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        return count.parse().ok().map(Length::Samples);
    }

    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    let last = parts.len() - 1;
    let mut seconds = 0.0;
    for (i, part) in parts.iter().enumerate() {
        let digits_only = part.bytes().all(|b| b.is_ascii_digit());
        let valid = if i == last {
            part.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        } else {
            digits_only
        };
        if part.is_empty() || !valid {
            return None;
        }
        let value: f64 = part.parse().ok()?;
        seconds = seconds * 60.0 + value;
    }
    Some(Length::Seconds(seconds))
}

/// Frequency of a MIDI note number, A4 (69) = 440 Hz.
pub fn midi_to_frequency(midi: f64) -> f64 {
    440.0 * 2.0_f64.powf((midi - 69.0) / 12.0)
}

/// Leading decimal number of `text` and the rest of it.
fn split_number(text: &str, signed: bool) -> Option<(f64, &str)> {
    let bytes = text.as_bytes();
    let mut end = 0;
    if signed && matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }
    let value = text[..end].parse().ok()?;
    Some((value, &text[end..]))
}

/// Leading note name (`C4`, `F#3`, `Bb5`) as a frequency, and the rest.
fn split_note(text: &str) -> Option<(f64, &str)> {
    let bytes = text.as_bytes();
    let mut semitone: i32 = match bytes.first()? {
        b'C' => 0,
        b'D' => 2,
        b'E' => 4,
        b'F' => 5,
        b'G' => 7,
        b'A' => 9,
        b'B' => 11,
        _ => return None,
    };

    let mut idx = 1;
    match bytes.get(idx) {
        Some(b'#') => {
            semitone += 1;
            idx += 1;
        }
        Some(b'b') => {
            semitone -= 1;
            idx += 1;
        }
        _ => {}
    }

    let digits = bytes[idx..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let octave: i32 = text[idx..idx + digits].parse().ok()?;

    // MIDI note number: C4 = 60
    let midi = (octave + 1) * 12 + semitone;
    Some((midi_to_frequency(midi as f64), &text[idx + digits..]))
}

/// One frequency: `%n` semitones from A440, a note name, or Hz with an
/// optional `k` multiplier.
fn split_frequency(text: &str) -> Option<(f64, &str)> {
    if let Some(rest) = text.strip_prefix('%') {
        let (semitones, rest) = split_number(rest, true)?;
        return Some((midi_to_frequency(69.0 + semitones), rest));
    }
    if text.starts_with(|c: char| matches!(c, 'A'..='G')) {
        return split_note(text);
    }
    let unsigned = text.strip_prefix('+').unwrap_or(text);
    let (hz, rest) = split_number(unsigned, false)?;
    match rest.strip_prefix('k') {
        Some(rest) => Some((hz * 1000.0, rest)),
        None => Some((hz, rest)),
    }
}

/// `freq[k][:|+|/|-freq2[k]]`.
fn parse_frequency_word(
    word: &Spanned,
    has_length: bool,
) -> Result<(f64, Option<Sweep>), ParseError> {
    let invalid = || ParseError::InvalidFrequency {
        text: word.text.clone(),
        span: word.span,
    };

    let (freq, mut rest) = split_frequency(&word.text).ok_or_else(invalid)?;
    let mut sweep = None;
    if let Some(law) = rest.chars().next().and_then(SweepLaw::from_separator) {
        let (target, tail) = split_frequency(&rest[1..]).ok_or_else(invalid)?;
        if !has_length {
            return Err(ParseError::SweepWithoutDuration { span: word.span });
        }
        sweep = Some(Sweep { law, target });
        rest = tail;
    }

    if !rest.is_empty() {
        return Err(ParseError::TrailingCharacter {
            text: word.text.clone(),
            span: word.span,
        });
    }
    Ok((freq, sweep))
}
