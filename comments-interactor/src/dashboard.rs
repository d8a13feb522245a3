//! HTML rendering for the dashboard page.

use std::fmt::Write;

use crate::engine::EngineClientError;

/// What happened to a form submission, if there was one.
#[derive(Debug)]
pub enum Submission {
    /// Empty or unparseable form; the engine was never contacted.
    Rejected,
    Posted,
    Failed(EngineClientError),
}

const FORM: &str = concat!(
    r#"<form method="post">"#,
    r#"<textarea name="comment" autofocus="true" placeholder="your comment ..." rows="5" cols="80"></textarea><br/>"#,
    r#"<input type="submit" value="send comment">"#,
    "</form>",
);

pub fn render_page(
    submission: Option<&Submission>,
    latest: &Result<Vec<String>, EngineClientError>,
) -> String {
    let mut page =
        String::from("<!doctype html><html><head><title>CommentsInteractor</title></head><body>");

    if let Some(submission) = submission {
        render_submission(&mut page, submission);
    }

    page.push_str("<h1>Latest comments</h1><p>");
    render_latest(&mut page, latest);
    page.push_str("</p>");

    page.push_str("<h1>Send comment</h1>");
    page.push_str(FORM);
    page.push_str("</body></html>");
    page
}

fn render_submission(page: &mut String, submission: &Submission) {
    match submission {
        Submission::Rejected => page.push_str("<h1>error</h1><p>Empty comment or malformed</p>"),
        Submission::Posted => page.push_str("<h1>Success !</h1><p>Comment posted</p>"),
        Submission::Failed(err) => {
            let _ = write!(
                page,
                "<h1>Error</h1><p>Error while trying to send a comment: {}</p>",
                escape(&err.to_string())
            );
        }
    }
}

fn render_latest(page: &mut String, latest: &Result<Vec<String>, EngineClientError>) {
    match latest {
        Ok(comments) => {
            for (i, comment) in comments.iter().enumerate() {
                let _ = write!(
                    page,
                    "<div><h3>comment {i}</h3><p>{}</p></div>",
                    escape(comment)
                );
            }
        }
        Err(EngineClientError::Engine {
            message,
            additional_info,
            ..
        }) => {
            let _ = write!(
                page,
                "CommentsEngine returned an error: {}<br/>Additional info: {}",
                escape(message),
                escape(additional_info)
            );
        }
        Err(err) => page.push_str(&escape(&err.to_string())),
    }
}

/// Escapes text for use in HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralises_markup() {
        assert_eq!(
            escape(r#"<script>alert("x & 'y'")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; &#39;y&#39;&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn comments_are_numbered_in_engine_order() {
        let latest = Ok(vec!["newest".to_string(), "<b>older</b>".to_string()]);
        let page = render_page(None, &latest);

        let newest = page
            .find("<div><h3>comment 0</h3><p>newest</p></div>")
            .expect("newest comment");
        let older = page
            .find("<div><h3>comment 1</h3><p>&lt;b&gt;older&lt;/b&gt;</p></div>")
            .expect("older comment");
        assert!(newest < older);
        assert!(page.ends_with("</form></body></html>"));
    }

    #[test]
    fn submission_block_precedes_the_dashboard() {
        let page = render_page(Some(&Submission::Posted), &Ok(vec![]));
        let success = page.find("Comment posted").expect("success block");
        let heading = page.find("<h1>Latest comments</h1>").expect("heading");
        assert!(success < heading);

        let page = render_page(Some(&Submission::Rejected), &Ok(vec![]));
        assert!(page.contains("<h1>error</h1><p>Empty comment or malformed</p>"));
    }

    #[test]
    fn engine_errors_show_message_and_additional_info() {
        let latest = Err(EngineClientError::Engine {
            status: 500,
            message: "store unavailable: refused".to_string(),
            additional_info: "Maybe there is a problem with the store backend?".to_string(),
        });
        let page = render_page(None, &latest);
        assert!(page.contains(
            "CommentsEngine returned an error: store unavailable: refused<br/>\
             Additional info: Maybe there is a problem with the store backend?"
        ));
    }

    #[test]
    fn malformed_engine_responses_are_reported() {
        let latest = Err(EngineClientError::Malformed("expected value".to_string()));
        let page = render_page(None, &latest);
        assert!(page.contains("CommentsEngine returned badly formatted values, expected value"));
    }
}
