//! Creates the default groups and sample admin, freelancer and client accounts.
//! Existing accounts are left untouched, so the command can be rerun.

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use diesel::prelude::*;
use uuid::Uuid;

use lancer_shared::clients::db::{checkout, create_pool};
use lancer_shared::middleware::init_tracing;
use lancer_shared::types::auth::UserType;

use lancer_users::account::{AccountSecurity, PgAccountStore, SystemClock};
use lancer_users::config::AppConfig;
use lancer_users::models::{
    CertificationInput, EducationInput, ExperienceInput, NewUser, PortfolioInput, SocialLinkInput,
};
use lancer_users::schema::{
    user_certifications, user_education, user_experience, user_portfolio, user_social_links, users,
};
use lancer_users::services::{auth_service, group_service, profile_service};

fn date(y: i32, m: u32, d: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| anyhow!("invalid date {y}-{m}-{d}"))
}

fn sample_user(
    email: &str,
    username: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
    user_type: UserType,
    phone_number: Option<&str>,
) -> anyhow::Result<NewUser> {
    Ok(NewUser {
        email: email.to_string(),
        username: username.to_string(),
        password_hash: auth_service::hash_password(password)?,
        first_name: Some(first_name.to_string()),
        last_name: Some(last_name.to_string()),
        user_type: user_type.as_str().to_string(),
        phone_number: phone_number.map(str::to_string),
        profile_picture: None,
        is_verified: true,
    })
}

fn seed_admin(conn: &mut PgConnection) -> anyhow::Result<Option<Uuid>> {
    let email = "admin@example.com";
    if profile_service::email_exists(conn, email)? {
        return Ok(None);
    }
    let new_user = sample_user(email, "admin", "admin123", "Admin", "User", UserType::Admin, None)?;
    let id: Uuid = diesel::insert_into(users::table)
        .values(&new_user)
        .returning(users::id)
        .get_result(conn)?;
    group_service::assign_group(conn, id, group_service::ADMIN_GROUP, false)?;
    Ok(Some(id))
}

fn seed_freelancer(conn: &mut PgConnection) -> anyhow::Result<Option<Uuid>> {
    let email = "freelancer@example.com";
    if profile_service::email_exists(conn, email)? {
        return Ok(None);
    }
    let new_user = sample_user(
        email,
        "freelancer1",
        "freelancer123",
        "John",
        "Developer",
        UserType::Freelancer,
        Some("+1234567890"),
    )?;

    conn.transaction(|conn| {
        let id: Uuid = diesel::insert_into(users::table)
            .values((
                &new_user,
                users::bio.eq("Full-stack developer with 5 years of experience"),
                users::country.eq("United States"),
                users::city.eq("New York"),
                users::title.eq("Senior Full Stack Developer"),
                users::website.eq("https://johndeveloper.com"),
                users::linkedin_url.eq("https://linkedin.com/in/johndeveloper"),
                users::github_url.eq("https://github.com/johndeveloper"),
                users::skills.eq(vec!["Python", "JavaScript", "React", "Django", "PostgreSQL"]),
                users::experience_level.eq("senior"),
                users::years_of_experience.eq(5),
                users::languages_spoken.eq(vec!["English", "Spanish"]),
                users::hourly_rate_cents.eq(7500i64),
                users::availability_status.eq("available"),
                users::availability_hours_per_week.eq(40),
                users::average_rating.eq(4.8),
                users::total_reviews.eq(25),
                users::total_projects_completed.eq(50),
            ))
            .returning(users::id)
            .get_result(conn)?;

        group_service::assign_default_group(conn, id, UserType::Freelancer)?;

        diesel::insert_into(user_education::table)
            .values((
                &EducationInput {
                    degree: "Bachelor of Science".into(),
                    field_of_study: "Computer Science".into(),
                    institution: "MIT".into(),
                    start_date: date(2015, 9, 1)?,
                    end_date: Some(date(2019, 5, 30)?),
                    description: Some("Focused on software engineering and algorithms".into()),
                },
                user_education::user_id.eq(id),
            ))
            .execute(conn)?;

        let jobs = [
            ExperienceInput {
                title: "Senior Full Stack Developer".into(),
                company: "Tech Solutions Inc".into(),
                location: Some("New York, NY".into()),
                start_date: date(2021, 3, 1)?,
                end_date: None,
                description: Some("Lead development of web applications using React and Django".into()),
                is_current: true,
            },
            ExperienceInput {
                title: "Full Stack Developer".into(),
                company: "StartupXYZ".into(),
                location: Some("San Francisco, CA".into()),
                start_date: date(2019, 6, 1)?,
                end_date: Some(date(2021, 2, 28)?),
                description: Some("Developed and maintained multiple web applications".into()),
                is_current: false,
            },
        ];
        for job in &jobs {
            diesel::insert_into(user_experience::table)
                .values((job, user_experience::user_id.eq(id)))
                .execute(conn)?;
        }

        diesel::insert_into(user_certifications::table)
            .values((
                &CertificationInput {
                    name: "AWS Certified Solutions Architect".into(),
                    issuing_organization: "Amazon Web Services".into(),
                    issue_date: date(2022, 1, 15)?,
                    expiry_date: Some(date(2025, 1, 15)?),
                    credential_id: Some("AWS-CSA-2022-001".into()),
                    credential_url: None,
                },
                user_certifications::user_id.eq(id),
            ))
            .execute(conn)?;

        let projects = [
            PortfolioInput {
                title: "E-commerce Platform".into(),
                description: "Full-featured e-commerce platform built with Django and React".into(),
                image: None,
                url: Some("https://demo-ecommerce.com".into()),
                technologies_used: vec!["Django".into(), "React".into(), "PostgreSQL".into(), "Redis".into()],
                is_featured: true,
            },
            PortfolioInput {
                title: "Task Management App".into(),
                description: "Real-time collaborative task management application".into(),
                image: None,
                url: Some("https://taskmanager-demo.com".into()),
                technologies_used: vec!["React".into(), "Node.js".into(), "MongoDB".into(), "Socket.io".into()],
                is_featured: false,
            },
        ];
        for project in &projects {
            diesel::insert_into(user_portfolio::table)
                .values((project, user_portfolio::user_id.eq(id)))
                .execute(conn)?;
        }

        let links = [
            SocialLinkInput { platform: "linkedin".into(), url: "https://linkedin.com/in/johndeveloper".into() },
            SocialLinkInput { platform: "github".into(), url: "https://github.com/johndeveloper".into() },
        ];
        for link in &links {
            diesel::insert_into(user_social_links::table)
                .values((link, user_social_links::user_id.eq(id)))
                .execute(conn)?;
        }

        Ok::<_, anyhow::Error>(Some(id))
    })
}

fn seed_client(conn: &mut PgConnection) -> anyhow::Result<Option<Uuid>> {
    let email = "client@example.com";
    if profile_service::email_exists(conn, email)? {
        return Ok(None);
    }
    let new_user = sample_user(
        email,
        "client1",
        "client123",
        "Sarah",
        "Johnson",
        UserType::Client,
        Some("+1987654321"),
    )?;

    let id: Uuid = diesel::insert_into(users::table)
        .values((
            &new_user,
            users::bio.eq("CEO of a growing tech startup looking for talented freelancers"),
            users::country.eq("United States"),
            users::city.eq("San Francisco"),
            users::company_name.eq("InnovateTech Solutions"),
            users::company_size.eq("small"),
            users::industry.eq("Technology"),
            users::website.eq("https://innovatetech.com"),
            users::total_projects_posted.eq(12),
            users::total_spent_cents.eq(1_500_000i64),
        ))
        .returning(users::id)
        .get_result(conn)?;
    group_service::assign_default_group(conn, id, UserType::Client)?;
    Ok(Some(id))
}

fn main() -> anyhow::Result<()> {
    init_tracing("lancer-seed");

    let config = AppConfig::load()?;
    let pool = create_pool(&config.database_url, 2)?;
    let mut conn = checkout(&pool)?;

    group_service::ensure_default_groups(&mut conn)?;

    let security = AccountSecurity::new(PgAccountStore::new(pool.clone()), SystemClock);
    let seeded = [
        ("admin@example.com", "admin123", seed_admin(&mut conn).context("seeding admin")?),
        ("freelancer@example.com", "freelancer123", seed_freelancer(&mut conn).context("seeding freelancer")?),
        ("client@example.com", "client123", seed_client(&mut conn).context("seeding client")?),
    ];

    for (email, password, created) in seeded {
        match created {
            Some(id) => {
                let completion = security.refresh_completion(id)?;
                tracing::info!(email, password, completion, "sample account created");
            }
            None => tracing::info!(email, "sample account already exists"),
        }
    }

    tracing::info!("seed complete");
    Ok(())
}
