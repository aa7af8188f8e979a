/// The analog voice the engine plays through.
///
/// Setters stage values; nothing reaches the hardware until
/// [`commit()`](VoiceOutput::commit), which must run once per tick after
/// the engine state for that tick is final.
pub trait VoiceOutput {
    type Error;

    /// Stage a 6-bit semitone and the 2 octave bits that share its latch.
    fn set_pitch(&mut self, note: u8, octave_bits: u8);

    fn set_gate(&mut self, on: bool);

    fn set_accent(&mut self, on: bool);

    fn set_slide(&mut self, on: bool);

    fn commit(&mut self) -> Result<(), Self::Error>;
}
