//! Bare HTML for the forms and the profile page. No template engine; every
//! interpolated value goes through [`escape`].

use crate::auth::repo_types::User;

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n</body></html>\n",
        escape(title),
        body
    )
}

fn flash(msg: Option<&str>) -> String {
    msg.map(|m| format!("<p class=\"flash danger\">{}</p>\n", escape(m)))
        .unwrap_or_default()
}

pub fn home() -> String {
    layout(
        "Home",
        "<h1>Welcome</h1>\n<a href=\"/signup\">Signup</a> | <a href=\"/login\">Login</a>",
    )
}

pub fn signup_form(msg: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Signup</h1>
{}<form method="post" action="/signup" enctype="multipart/form-data">
<input name="username" placeholder="Username" minlength="4" maxlength="20" required>
<input name="password" type="password" placeholder="Password" minlength="4" maxlength="20" required>
<input name="name" placeholder="Full Name" required>
<input name="age" placeholder="Age" required>
<input name="gender" placeholder="Gender" required>
<input name="dob" placeholder="Date of Birth (YYYY-MM-DD)" required>
<input name="profile_picture" type="file" accept=".png,.jpg,.jpeg,.gif">
<button type="submit">Signup</button>
</form>
<a href="/login">Already have an account? Log in</a>"#,
        flash(msg)
    );
    layout("Signup", &body)
}

pub fn login_form(msg: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Login</h1>
{}<form method="post" action="/login">
<input name="username" placeholder="Username" minlength="4" maxlength="20" required>
<input name="password" type="password" placeholder="Password" minlength="4" maxlength="20" required>
<button type="submit">Login</button>
</form>
<a href="/signup">Don't have an account? Sign up</a>"#,
        flash(msg)
    );
    layout("Login", &body)
}

pub fn profile(user: &User) -> String {
    let picture = user
        .profile_picture
        .as_deref()
        .map(|key| {
            format!(
                "<img src=\"/uploads/{}\" alt=\"Profile picture\">\n",
                escape(key)
            )
        })
        .unwrap_or_default();
    let body = format!(
        r#"<h1>Profile</h1>
{}<ul>
<li>Username: {}</li>
<li>Name: {}</li>
<li>Age: {}</li>
<li>Gender: {}</li>
<li>Date of Birth: {}</li>
</ul>
<a href="/logout">Logout</a>"#,
        picture,
        escape(&user.username),
        escape(&user.name),
        user.age,
        escape(&user.gender),
        user.dob,
    );
    layout("Profile", &body)
}

pub fn message_page(msg: &str) -> String {
    layout(
        "Notice",
        &format!("<p>{}</p>\n<a href=\"/\">Home</a>", escape(msg)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#x27;y&#x27;"
        );
    }

    #[test]
    fn login_form_shows_flash_only_when_present() {
        assert!(!login_form(None).contains("flash"));
        let page = login_form(Some("Login failed. Please check your username and password."));
        assert!(page.contains("class=\"flash danger\""));
        assert!(page.contains("Login failed"));
    }
}
