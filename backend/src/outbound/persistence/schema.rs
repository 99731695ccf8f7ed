//! Diesel table definitions for the panel schema.
//!
//! These must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Administrators, resellers and clients.
    admin (admin_id) {
        admin_id -> Int8,
        admin_name -> Text,
        /// Lowercase hex SHA-256 of the password.
        admin_pass -> Text,
        /// `admin`, `reseller` or `user`.
        admin_type -> Text,
        email -> Text,
        created_by -> Nullable<Int8>,
    }
}

diesel::table! {
    /// Reseller limits and cached usage counters.
    ///
    /// Maxima use `0` for unlimited and `-1` for disabled. Traffic and disk
    /// maxima are MiB; the matching current values are bytes.
    reseller_props (reseller_id) {
        reseller_id -> Int8,
        max_dmn_cnt -> Int8,
        current_dmn_cnt -> Int8,
        max_sub_cnt -> Int8,
        current_sub_cnt -> Int8,
        max_als_cnt -> Int8,
        current_als_cnt -> Int8,
        max_mail_cnt -> Int8,
        current_mail_cnt -> Int8,
        max_ftp_cnt -> Int8,
        current_ftp_cnt -> Int8,
        max_sql_db_cnt -> Int8,
        current_sql_db_cnt -> Int8,
        max_sql_user_cnt -> Int8,
        current_sql_user_cnt -> Int8,
        max_traff_amnt -> Int8,
        current_traff_amnt -> Int8,
        max_disk_amnt -> Int8,
        current_disk_amnt -> Int8,
        support_system -> Bool,
        php_ini_system -> Bool,
        software_allowed -> Bool,
    }
}

diesel::table! {
    /// Client primary domains.
    domain (domain_id) {
        domain_id -> Int8,
        domain_name -> Text,
        /// Owning client.
        domain_admin_id -> Int8,
        /// Reseller that created the client.
        domain_created_id -> Int8,
        domain_ip_id -> Int8,
        domain_status -> Text,
        domain_traffic_bytes -> Int8,
        domain_disk_usage -> Int8,
    }
}

diesel::table! {
    domain_aliasses (alias_id) {
        alias_id -> Int8,
        domain_id -> Int8,
        alias_name -> Text,
        alias_mount -> Text,
        alias_status -> Text,
        alias_ip_id -> Int8,
        /// Forward URL or the literal `no`.
        url_forward -> Text,
    }
}

diesel::table! {
    subdomain (subdomain_id) {
        subdomain_id -> Int8,
        domain_id -> Int8,
        subdomain_name -> Text,
        subdomain_mount -> Text,
        subdomain_status -> Text,
    }
}

diesel::table! {
    subdomain_alias (subdomain_alias_id) {
        subdomain_alias_id -> Int8,
        alias_id -> Int8,
        subdomain_alias_name -> Text,
        subdomain_alias_mount -> Text,
        subdomain_alias_status -> Text,
    }
}

diesel::table! {
    mail_users (mail_id) {
        mail_id -> Int8,
        domain_id -> Int8,
        /// Alias id for alias mailboxes, `0` otherwise.
        sub_id -> Int8,
        mail_acc -> Text,
        mail_addr -> Text,
        mail_type -> Text,
        mail_forward -> Text,
        status -> Text,
        is_default -> Bool,
    }
}

diesel::table! {
    ftp_users (ftp_id) {
        ftp_id -> Int8,
        domain_id -> Int8,
        userid -> Text,
        status -> Text,
    }
}

diesel::table! {
    sql_database (sqld_id) {
        sqld_id -> Int8,
        domain_id -> Int8,
        sqld_name -> Text,
        status -> Text,
    }
}

diesel::table! {
    sql_user (sqlu_id) {
        sqlu_id -> Int8,
        sqld_id -> Int8,
        sqlu_name -> Text,
        status -> Text,
    }
}

diesel::table! {
    /// Control panel audit log.
    log (log_id) {
        log_id -> Int8,
        log_time -> Timestamptz,
        log_message -> Text,
    }
}

diesel::table! {
    tickets (ticket_id) {
        ticket_id -> Int8,
        ticket_from -> Int8,
        ticket_to -> Int8,
        ticket_status -> Int4,
        /// `0` for the first message of a thread.
        ticket_reply -> Int8,
        ticket_subject -> Text,
    }
}

diesel::table! {
    orders (id) {
        id -> Int8,
        user_id -> Int8,
        domain_name -> Text,
        status -> Text,
    }
}

diesel::table! {
    /// Idempotency records for safe request retries.
    ///
    /// Keyed by `(key, reseller_id, mutation_type)` so one UUID may be reused
    /// across operation kinds.
    idempotency_keys (key, reseller_id, mutation_type) {
        key -> Uuid,
        reseller_id -> Int8,
        mutation_type -> Text,
        payload_hash -> Bytea,
        response_snapshot -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(domain_aliasses -> domain (domain_id));
diesel::joinable!(subdomain -> domain (domain_id));
diesel::joinable!(subdomain_alias -> domain_aliasses (alias_id));
diesel::joinable!(mail_users -> domain (domain_id));
diesel::joinable!(reseller_props -> admin (reseller_id));

diesel::allow_tables_to_appear_in_same_query!(
    admin,
    reseller_props,
    domain,
    domain_aliasses,
    subdomain,
    subdomain_alias,
    mail_users,
    ftp_users,
    sql_database,
    sql_user,
    log,
    tickets,
    orders,
    idempotency_keys,
);
