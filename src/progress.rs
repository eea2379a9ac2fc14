use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{prefix:>10} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}";

pub fn transfer_bar(len: usize, verb: &str) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_prefix(verb.to_string());
    bar
}
